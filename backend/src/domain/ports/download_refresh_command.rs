//! Driving port for reconciling an order's downloads with the catalogue.

use async_trait::async_trait;

use crate::domain::{CallerContext, Error, OrderId};

/// Request to refresh one order's downloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshDownloadsRequest {
    pub order_id: OrderId,
    pub caller: CallerContext,
}

/// Outcome of a reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshDownloadsResponse {
    /// Downloads added because the catalogue offers new files.
    pub added: usize,
    /// Existing downloads whose metadata was refreshed.
    pub updated: usize,
}

/// Driving port for download reconciliation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DownloadRefreshCommand: Send + Sync {
    /// Refresh the order's downloads from the catalogue and persist them.
    async fn refresh_downloads(
        &self,
        request: RefreshDownloadsRequest,
    ) -> Result<RefreshDownloadsResponse, Error>;
}

/// Fixture command acknowledging every refresh without changes.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureDownloadRefreshCommand;

#[async_trait]
impl DownloadRefreshCommand for FixtureDownloadRefreshCommand {
    async fn refresh_downloads(
        &self,
        _request: RefreshDownloadsRequest,
    ) -> Result<RefreshDownloadsResponse, Error> {
        Ok(RefreshDownloadsResponse::default())
    }
}
