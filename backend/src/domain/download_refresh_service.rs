//! Reconciles an order's downloads with the external catalogue.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;

use crate::domain::download_service_support::{
    ORDER_NOT_FOUND, map_download_repository_error, map_order_repository_error,
};
use crate::domain::ports::{
    CatalogueDownload, DownloadCatalogue, DownloadRefreshCommand, DownloadRepository,
    OrderRepository, RefreshDownloadsRequest, RefreshDownloadsResponse,
};
use crate::domain::{
    EntitlementSubject, Error, OrderLineItem, authorise_order, merge_catalogue_downloads,
};

/// Download refresh service implementing [`DownloadRefreshCommand`].
pub struct DownloadRefreshService<D, O, C> {
    downloads: Arc<D>,
    orders: Arc<O>,
    catalogue: Arc<C>,
    clock: Arc<dyn Clock>,
}

impl<D, O, C> DownloadRefreshService<D, O, C> {
    pub fn new(downloads: Arc<D>, orders: Arc<O>, catalogue: Arc<C>, clock: Arc<dyn Clock>) -> Self {
        Self {
            downloads,
            orders,
            catalogue,
            clock,
        }
    }
}

impl<D, O, C> DownloadRefreshService<D, O, C>
where
    C: DownloadCatalogue,
{
    async fn fetch_offers(
        &self,
        line_items: Vec<OrderLineItem>,
    ) -> Result<Vec<(OrderLineItem, Vec<CatalogueDownload>)>, Error> {
        let mut offers = Vec::with_capacity(line_items.len());
        for line_item in line_items {
            let offered = self
                .catalogue
                .downloads_for_line_item(&line_item)
                .await
                .map_err(|err| {
                    tracing::error!(
                        line_item_id = %line_item.id,
                        path = %line_item.path,
                        error = %err,
                        "catalogue lookup failed"
                    );
                    Error::internal(format!("Error during updating downloads: {err}"))
                })?;
            offers.push((line_item, offered));
        }
        Ok(offers)
    }
}

#[async_trait]
impl<D, O, C> DownloadRefreshCommand for DownloadRefreshService<D, O, C>
where
    D: DownloadRepository,
    O: OrderRepository,
    C: DownloadCatalogue,
{
    async fn refresh_downloads(
        &self,
        request: RefreshDownloadsRequest,
    ) -> Result<RefreshDownloadsResponse, Error> {
        let order_id = request.order_id;
        let order = self
            .orders
            .find_by_id(&order_id)
            .await
            .map_err(|err| map_order_repository_error("load order", order_id, err))?
            .ok_or_else(|| Error::not_found(ORDER_NOT_FOUND))?;
        authorise_order(&request.caller, &order, EntitlementSubject::Order)?;

        let line_items = self
            .orders
            .find_line_items(&order_id)
            .await
            .map_err(|err| map_order_repository_error("load line items", order_id, err))?;
        let existing = self
            .downloads
            .list_for_order(&order_id)
            .await
            .map_err(|err| map_download_repository_error("load downloads", order_id, err))?;

        let offers = self.fetch_offers(line_items).await?;
        let merge = merge_catalogue_downloads(order_id, existing, &offers, self.clock.utc())
            .map_err(|err| {
                tracing::error!(%order_id, error = %err, "catalogue offered an invalid download");
                Error::internal(format!("Error during updating downloads: {err}"))
            })?;

        if !merge.is_empty() {
            self.downloads
                .save_all(&order_id, &merge.changed)
                .await
                .map_err(|err| map_download_repository_error("save downloads", order_id, err))?;
        }

        tracing::info!(%order_id, added = merge.added, updated = merge.updated, "downloads refreshed");
        Ok(RefreshDownloadsResponse {
            added: merge.added,
            updated: merge.updated,
        })
    }
}
