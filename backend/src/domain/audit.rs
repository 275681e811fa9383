//! Audit recorder pairing every counter increment with a ledger entry.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::ports::{DownloadAccessRecord, DownloadAuditRepository, DownloadAuditRepositoryError};
use super::{Download, Error, NewEvent, SourceAddress, UserId};

fn map_audit_error(download: &Download, error: DownloadAuditRepositoryError) -> Error {
    tracing::error!(
        download_id = %download.id(),
        order_id = %download.order_id(),
        error = %error,
        "recording download access failed; nothing was committed"
    );
    Error::internal(format!(
        "recording access to download {} failed: {error}",
        download.id()
    ))
}

/// Records download accesses through a [`DownloadAuditRepository`].
pub struct AuditRecorder<A> {
    audit: Arc<A>,
}

impl<A> Clone for AuditRecorder<A> {
    fn clone(&self) -> Self {
        Self {
            audit: Arc::clone(&self.audit),
        }
    }
}

impl<A> AuditRecorder<A>
where
    A: DownloadAuditRepository,
{
    pub fn new(audit: Arc<A>) -> Self {
        Self { audit }
    }

    /// Increment the download counter and append an `updated` event tagged
    /// `download` in one unit of work, returning the committed counter.
    ///
    /// On failure neither write is visible and an internal error is returned.
    pub async fn record_access(
        &self,
        download: &Download,
        actor: Option<&UserId>,
        source_address: &SourceAddress,
        now: DateTime<Utc>,
    ) -> Result<u64, Error> {
        let record = DownloadAccessRecord {
            download_id: download.id(),
            event: NewEvent::download_access(
                download.order_id(),
                actor.cloned(),
                source_address.clone(),
                now,
            ),
        };
        let committed = self
            .audit
            .record_access(&record)
            .await
            .map_err(|err| map_audit_error(download, err))?;
        tracing::debug!(
            download_id = %download.id(),
            download_count = committed,
            "download access recorded"
        );
        Ok(committed)
    }
}
