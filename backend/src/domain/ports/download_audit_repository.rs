//! Port for the atomic counter-plus-ledger write behind every download.

use async_trait::async_trait;

use crate::domain::{DownloadId, NewEvent};

use super::define_port_error;

define_port_error! {
    /// Errors raised by download audit adapters.
    pub enum DownloadAuditRepositoryError {
        /// Store connection could not be established.
        Connection { message: String } =>
            "download audit connection failed: {message}",
        /// The download disappeared before the counter could be bumped.
        MissingDownload { download_id: String } =>
            "download {download_id} vanished before its access was recorded",
        /// The transaction failed and was rolled back.
        Transaction { message: String } =>
            "download audit transaction failed: {message}",
    }
}

/// One access to record: the download whose counter grows and the ledger
/// entry appended alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadAccessRecord {
    pub download_id: DownloadId,
    pub event: NewEvent,
}

/// Writes a download access atomically.
///
/// Implementations must commit the counter increment and the ledger append
/// together or not at all.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DownloadAuditRepository: Send + Sync {
    /// Increment the counter by one, append the event, and return the
    /// committed counter value.
    async fn record_access(
        &self,
        record: &DownloadAccessRecord,
    ) -> Result<u64, DownloadAuditRepositoryError>;
}

/// Fixture implementation that reports a first access without storing it.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureDownloadAuditRepository;

#[async_trait]
impl DownloadAuditRepository for FixtureDownloadAuditRepository {
    async fn record_access(
        &self,
        _record: &DownloadAccessRecord,
    ) -> Result<u64, DownloadAuditRepositoryError> {
        Ok(1)
    }
}
