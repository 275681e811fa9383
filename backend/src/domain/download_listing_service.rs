//! Paginated listing of downloads attached to paid orders.

use std::sync::Arc;

use async_trait::async_trait;
use pagination::PageRequest;

use crate::domain::download_service_support::{
    ORDER_NOT_FOUND, map_download_repository_error, map_order_repository_error,
};
use crate::domain::ports::{
    DownloadRepository, DownloadScope, DownloadsQuery, ListDownloadsRequest,
    ListDownloadsResponse, OrderRepository,
};
use crate::domain::{CallerContext, EntitlementSubject, Error, OrderId, authorise_order};

/// Download listing service implementing [`DownloadsQuery`].
#[derive(Clone)]
pub struct DownloadListingService<D, O> {
    downloads: Arc<D>,
    orders: Arc<O>,
}

impl<D, O> DownloadListingService<D, O> {
    pub fn new(downloads: Arc<D>, orders: Arc<O>) -> Self {
        Self { downloads, orders }
    }
}

impl<D, O> DownloadListingService<D, O>
where
    D: DownloadRepository,
    O: OrderRepository,
{
    async fn scope_for(
        &self,
        order_id: Option<OrderId>,
        caller: &CallerContext,
    ) -> Result<DownloadScope, Error> {
        match order_id {
            Some(order_id) => {
                let order = self
                    .orders
                    .find_by_id(&order_id)
                    .await
                    .map_err(|err| map_order_repository_error("load order", order_id, err))?
                    .ok_or_else(|| Error::not_found(ORDER_NOT_FOUND))?;
                authorise_order(caller, &order, EntitlementSubject::Order)?;
                Ok(DownloadScope::Order(order_id))
            }
            None => caller
                .user_id()
                .cloned()
                .map(DownloadScope::Owner)
                .ok_or_else(|| Error::unauthorized("You must be signed in to list downloads")),
        }
    }
}

#[async_trait]
impl<D, O> DownloadsQuery for DownloadListingService<D, O>
where
    D: DownloadRepository,
    O: OrderRepository,
{
    async fn list_downloads(
        &self,
        request: ListDownloadsRequest,
    ) -> Result<ListDownloadsResponse, Error> {
        let page = PageRequest::new(request.offset, request.limit)
            .map_err(|err| Error::invalid_request(format!("Bad Pagination Parameters: {err}")))?;
        let scope = self.scope_for(request.order_id, &request.caller).await?;

        let total = self
            .downloads
            .count_paid(&scope)
            .await
            .map_err(|err| map_download_repository_error("count downloads", format!("{scope:?}"), err))?;
        let downloads = self
            .downloads
            .list_paid(&scope, page)
            .await
            .map_err(|err| map_download_repository_error("list downloads", format!("{scope:?}"), err))?;

        tracing::debug!(returned = downloads.len(), total, "downloads listed");
        Ok(ListDownloadsResponse {
            downloads,
            page,
            total,
        })
    }
}

#[cfg(test)]
#[path = "download_listing_service_tests.rs"]
mod tests;
