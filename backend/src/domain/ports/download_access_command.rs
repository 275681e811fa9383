//! Driving port for fetching a single download.
//!
//! A successful call has been authorised, throttled, signed and recorded.

use async_trait::async_trait;

use crate::domain::{CallerContext, Download, DownloadId, Error, SourceAddress};

/// Request to fetch one download with a freshly signed URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetDownloadRequest {
    pub download_id: DownloadId,
    pub caller: CallerContext,
    pub source_address: SourceAddress,
}

/// The download carrying its signed URL and committed counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetDownloadResponse {
    pub download: Download,
}

/// Driving port for download access.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DownloadAccessCommand: Send + Sync {
    /// Fetch a download.
    ///
    /// Fails with `NotFound` for an unknown download, `Unauthorized` when the
    /// caller does not own the order, the order is unpaid or too many distinct
    /// addresses accessed it within the throttle window, and `InternalError`
    /// for store or signing failures.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use backend::domain::{CallerContext, DownloadId, SourceAddress};
    /// # use backend::domain::ports::{DownloadAccessCommand, FixtureDownloadAccessCommand, GetDownloadRequest};
    /// # async fn example() {
    /// let result = FixtureDownloadAccessCommand
    ///     .get_download(GetDownloadRequest {
    ///         download_id: DownloadId::random(),
    ///         caller: CallerContext::anonymous(),
    ///         source_address: SourceAddress::unknown(),
    ///     })
    ///     .await;
    /// assert!(result.is_err());
    /// # }
    /// ```
    async fn get_download(&self, request: GetDownloadRequest) -> Result<GetDownloadResponse, Error>;
}

/// Fixture command that knows no downloads.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureDownloadAccessCommand;

#[async_trait]
impl DownloadAccessCommand for FixtureDownloadAccessCommand {
    async fn get_download(&self, request: GetDownloadRequest) -> Result<GetDownloadResponse, Error> {
        Err(Error::not_found(format!(
            "download {} not found",
            request.download_id
        )))
    }
}
