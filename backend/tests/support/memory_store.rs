//! In-memory store implementing every driven download port.
//!
//! All tables sit behind one lock so an audit write lands whole or not at
//! all. `fail_commit` makes the next audit write fail after staging.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;
use pagination::PageRequest;
use uuid::Uuid;

use backend::domain::ports::{
    CatalogueDownload, DistinctAddressQuery, DownloadAccessRecord, DownloadAuditRepository,
    DownloadAuditRepositoryError, DownloadCatalogue, DownloadCatalogueError, DownloadRepository,
    DownloadRepositoryError, DownloadScope, EventLedger, EventLedgerError, OrderRepository,
    OrderRepositoryError,
};
use backend::domain::{
    AssetReference, Download, DownloadDraft, DownloadId, Event, NewEvent, Order, OrderId,
    OrderLineItem, PaymentState, SourceAddress, UserId,
};

pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

#[derive(Default)]
pub struct Tables {
    pub orders: HashMap<OrderId, Order>,
    pub line_items: Vec<OrderLineItem>,
    pub downloads: Vec<Download>,
    pub events: Vec<Event>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    pub fail_commit: AtomicBool,
    pub download_reads: AtomicUsize,
    pub offers: Mutex<HashMap<String, Vec<CatalogueDownload>>>,
}

impl MemoryStore {
    pub fn tables(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().expect("store lock")
    }

    pub fn add_order(&self, state: PaymentState) -> (UserId, OrderId) {
        let owner = UserId::random();
        let order = Order::new(OrderId::random(), owner.clone(), state);
        let order_id = order.id();
        self.tables().orders.insert(order_id, order);
        (owner, order_id)
    }

    pub fn add_download(&self, order_id: OrderId, asset: &str, created_at: DateTime<Utc>) -> DownloadId {
        let download = Download::new(DownloadDraft {
            id: DownloadId::random(),
            order_id,
            line_item_id: None,
            title: "Field Guide".to_owned(),
            format: Some("pdf".to_owned()),
            asset: AssetReference::new(asset).expect("asset"),
            download_count: 0,
            created_at,
        })
        .expect("download");
        let id = download.id();
        self.tables().downloads.push(download);
        id
    }

    pub fn add_access_event(&self, order_id: OrderId, address: &str, at: DateTime<Utc>) {
        let event = NewEvent::download_access(order_id, None, SourceAddress::from_raw(address), at);
        self.tables().events.push(Event::from_new(Uuid::new_v4(), event));
    }

    pub fn count_of(&self, download_id: DownloadId) -> u64 {
        self.tables()
            .downloads
            .iter()
            .find(|download| download.id() == download_id)
            .map(Download::download_count)
            .expect("download present")
    }

    pub fn events_for(&self, order_id: OrderId) -> Vec<Event> {
        self.tables()
            .events
            .iter()
            .filter(|event| event.order_id == order_id)
            .cloned()
            .collect()
    }

    fn paid_in_scope(tables: &Tables, scope: &DownloadScope) -> Vec<Download> {
        let mut matching: Vec<Download> = tables
            .downloads
            .iter()
            .filter(|download| {
                tables
                    .orders
                    .get(&download.order_id())
                    .is_some_and(|order| {
                        order.is_paid()
                            && match scope {
                                DownloadScope::Order(id) => order.id() == *id,
                                DownloadScope::Owner(user) => order.user_id() == user,
                            }
                    })
            })
            .cloned()
            .collect();
        matching.sort_by_key(|download| (download.created_at(), *download.id().as_uuid()));
        matching
    }
}

#[async_trait]
impl DownloadRepository for MemoryStore {
    async fn find_by_id(
        &self,
        download_id: &DownloadId,
    ) -> Result<Option<Download>, DownloadRepositoryError> {
        Ok(self
            .tables()
            .downloads
            .iter()
            .find(|download| download.id() == *download_id)
            .cloned())
    }

    async fn list_paid(
        &self,
        scope: &DownloadScope,
        page: PageRequest,
    ) -> Result<Vec<Download>, DownloadRepositoryError> {
        self.download_reads.fetch_add(1, Ordering::SeqCst);
        Ok(Self::paid_in_scope(&self.tables(), scope)
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect())
    }

    async fn count_paid(&self, scope: &DownloadScope) -> Result<u64, DownloadRepositoryError> {
        self.download_reads.fetch_add(1, Ordering::SeqCst);
        Ok(Self::paid_in_scope(&self.tables(), scope).len() as u64)
    }

    async fn list_for_order(
        &self,
        order_id: &OrderId,
    ) -> Result<Vec<Download>, DownloadRepositoryError> {
        Ok(self
            .tables()
            .downloads
            .iter()
            .filter(|download| download.order_id() == *order_id)
            .cloned()
            .collect())
    }

    async fn save_all(
        &self,
        _order_id: &OrderId,
        downloads: &[Download],
    ) -> Result<(), DownloadRepositoryError> {
        let mut tables = self.tables();
        for incoming in downloads {
            match tables
                .downloads
                .iter_mut()
                .find(|existing| existing.id() == incoming.id())
            {
                Some(existing) => {
                    let count = existing.download_count();
                    *existing = incoming.clone().with_download_count(count);
                }
                None => tables.downloads.push(incoming.clone()),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn find_by_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderRepositoryError> {
        Ok(self.tables().orders.get(order_id).cloned())
    }

    async fn find_line_items(
        &self,
        order_id: &OrderId,
    ) -> Result<Vec<OrderLineItem>, OrderRepositoryError> {
        Ok(self
            .tables()
            .line_items
            .iter()
            .filter(|item| item.order_id == *order_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EventLedger for MemoryStore {
    async fn count_distinct_addresses(
        &self,
        query: &DistinctAddressQuery,
    ) -> Result<u64, EventLedgerError> {
        let addresses: BTreeSet<String> = self
            .tables()
            .events
            .iter()
            .filter(|event| {
                event.order_id == query.order_id
                    && event.has_change(&query.change)
                    && query.covers(event.created_at)
            })
            .map(|event| event.source_address.as_str().to_owned())
            .collect();
        Ok(addresses.len() as u64)
    }

    async fn list_for_order(&self, order_id: &OrderId) -> Result<Vec<Event>, EventLedgerError> {
        Ok(self.events_for(*order_id))
    }
}

#[async_trait]
impl DownloadAuditRepository for MemoryStore {
    async fn record_access(
        &self,
        record: &DownloadAccessRecord,
    ) -> Result<u64, DownloadAuditRepositoryError> {
        let mut tables = self.tables();
        let Some(position) = tables
            .downloads
            .iter()
            .position(|download| download.id() == record.download_id)
        else {
            return Err(DownloadAuditRepositoryError::missing_download(
                record.download_id.to_string(),
            ));
        };

        // Stage both writes and apply them only if the commit succeeds.
        let next = tables.downloads[position].download_count() + 1;
        let staged = tables.downloads[position].clone().with_download_count(next);
        let event = Event::from_new(Uuid::new_v4(), record.event.clone());
        if self.fail_commit.load(Ordering::SeqCst) {
            return Err(DownloadAuditRepositoryError::transaction("commit refused"));
        }
        tables.downloads[position] = staged;
        tables.events.push(event);
        Ok(next)
    }
}

#[async_trait]
impl DownloadCatalogue for MemoryStore {
    async fn downloads_for_line_item(
        &self,
        line_item: &OrderLineItem,
    ) -> Result<Vec<CatalogueDownload>, DownloadCatalogueError> {
        Ok(self
            .offers
            .lock()
            .expect("offers lock")
            .get(&line_item.path)
            .cloned()
            .unwrap_or_default())
    }
}
