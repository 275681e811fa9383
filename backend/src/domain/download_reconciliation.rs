//! Merging catalogue offers into an order's existing downloads.
//!
//! Downloads are keyed by `(line item, format)`. A matching download keeps its
//! id and counter and picks up the catalogue's title and asset; an unmatched
//! offer becomes a new download. Downloads the catalogue no longer lists stay
//! untouched, so a catalogue change never revokes a purchase.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::ports::CatalogueDownload;
use super::{Download, DownloadDraft, DownloadId, DownloadValidationError, OrderId, OrderLineItem};

type MergeKey = (Uuid, Option<String>);

/// Downloads that must be written after a merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogueMerge {
    /// New or changed downloads, in catalogue order.
    pub changed: Vec<Download>,
    pub added: usize,
    pub updated: usize,
}

impl CatalogueMerge {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }
}

/// Merge catalogue offers for each line item into `existing`.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use uuid::Uuid;
/// use backend::domain::{
///     AssetReference, OrderId, OrderLineItem, merge_catalogue_downloads,
/// };
/// use backend::domain::ports::CatalogueDownload;
///
/// let order_id = OrderId::random();
/// let item = OrderLineItem {
///     id: Uuid::new_v4(),
///     order_id,
///     sku: "BOOK-1".into(),
///     title: "Book".into(),
///     path: "/products/book".into(),
/// };
/// let offer = CatalogueDownload {
///     title: "Book (PDF)".into(),
///     format: Some("pdf".into()),
///     asset: AssetReference::new("books/book.pdf").expect("asset"),
/// };
/// let merge = merge_catalogue_downloads(order_id, Vec::new(), &[(item, vec![offer])], Utc::now())
///     .expect("merge");
/// assert_eq!(merge.added, 1);
/// ```
pub fn merge_catalogue_downloads(
    order_id: OrderId,
    existing: Vec<Download>,
    offers: &[(OrderLineItem, Vec<CatalogueDownload>)],
    now: DateTime<Utc>,
) -> Result<CatalogueMerge, DownloadValidationError> {
    let mut by_key: HashMap<MergeKey, Download> = existing
        .into_iter()
        .filter_map(|download| {
            download.line_item_id().map(|line_item_id| {
                let key = (line_item_id, download.format().map(str::to_owned));
                (key, download)
            })
        })
        .collect();

    let mut merge = CatalogueMerge::default();
    let mut changed_index: HashMap<MergeKey, usize> = HashMap::new();

    for (line_item, offered) in offers {
        for offer in offered {
            let candidate = Download::new(DownloadDraft {
                id: DownloadId::random(),
                order_id,
                line_item_id: Some(line_item.id),
                title: offer.title.clone(),
                format: offer.format.clone(),
                asset: offer.asset.clone(),
                download_count: 0,
                created_at: now,
            })?;
            let key = (line_item.id, candidate.format().map(str::to_owned));

            if let Some(position) = changed_index.get(&key) {
                // Repeated offer for the same key: last one wins.
                if let Some(slot) = merge.changed.get_mut(*position) {
                    *slot = slot
                        .clone()
                        .with_catalogue_metadata(candidate.title().to_owned(), candidate.asset().clone());
                }
                continue;
            }

            let next = match by_key.remove(&key) {
                Some(current)
                    if current.title() == candidate.title()
                        && current.asset() == candidate.asset() =>
                {
                    by_key.insert(key, current);
                    continue;
                }
                Some(current) => {
                    merge.updated += 1;
                    current.with_catalogue_metadata(
                        candidate.title().to_owned(),
                        candidate.asset().clone(),
                    )
                }
                None => {
                    merge.added += 1;
                    candidate
                }
            };
            changed_index.insert(key, merge.changed.len());
            merge.changed.push(next);
        }
    }

    Ok(merge)
}
