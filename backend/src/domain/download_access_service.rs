//! Download access orchestrator.
//!
//! Runs the single-download pipeline: load, authorise, throttle, sign, record.
//! The first failure ends the request. Loading through signing runs under a
//! request deadline, so a deadline hit leaves the counter and ledger
//! untouched. Recording is never cut short: once the audit transaction
//! starts, its outcome is the outcome reported to the caller.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;

use crate::domain::download_service_support::{
    DOWNLOAD_NOT_FOUND, map_download_repository_error, map_order_repository_error,
};
use crate::domain::ports::{
    DownloadAccessCommand, DownloadAuditRepository, DownloadRepository, EventLedger,
    GetDownloadRequest, GetDownloadResponse, OrderRepository, UrlSigner,
};
use crate::domain::{
    AuditRecorder, DistinctAddressThrottle, Download, EntitlementSubject, Error, RateLimiter,
    SignedUrl, authorise_order,
};

/// Deadline applied to a download access when none is configured.
pub const DEFAULT_ACCESS_TIMEOUT: Duration = Duration::from_secs(10);

/// Collaborators required by [`DownloadAccessService`].
pub struct DownloadAccessDeps<D, O, L, A> {
    pub downloads: Arc<D>,
    pub orders: Arc<O>,
    pub ledger: Arc<L>,
    pub audit: Arc<A>,
    pub signer: Arc<dyn UrlSigner>,
    pub clock: Arc<dyn Clock>,
}

/// Download access service implementing [`DownloadAccessCommand`].
pub struct DownloadAccessService<D, O, L, A> {
    downloads: Arc<D>,
    orders: Arc<O>,
    limiter: RateLimiter<L>,
    recorder: AuditRecorder<A>,
    signer: Arc<dyn UrlSigner>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl<D, O, L, A> DownloadAccessService<D, O, L, A>
where
    D: DownloadRepository,
    O: OrderRepository,
    L: EventLedger,
    A: DownloadAuditRepository,
{
    /// Create a service with the default throttle and deadline.
    ///
    /// ```rust,no_run
    /// # use std::sync::Arc;
    /// # use backend::domain::{DownloadAccessDeps, DownloadAccessService};
    /// # use backend::domain::ports::{
    /// #     FixtureDownloadAuditRepository, FixtureDownloadRepository, FixtureEventLedger,
    /// #     FixtureOrderRepository, FixtureUrlSigner,
    /// # };
    /// # use mockable::DefaultClock;
    /// let service = DownloadAccessService::new(DownloadAccessDeps {
    ///     downloads: Arc::new(FixtureDownloadRepository),
    ///     orders: Arc::new(FixtureOrderRepository),
    ///     ledger: Arc::new(FixtureEventLedger),
    ///     audit: Arc::new(FixtureDownloadAuditRepository),
    ///     signer: Arc::new(FixtureUrlSigner),
    ///     clock: Arc::new(DefaultClock),
    /// });
    /// # let _ = service;
    /// ```
    pub fn new(deps: DownloadAccessDeps<D, O, L, A>) -> Self {
        Self {
            downloads: deps.downloads,
            orders: deps.orders,
            limiter: RateLimiter::new(deps.ledger, DistinctAddressThrottle::default()),
            recorder: AuditRecorder::new(deps.audit),
            signer: deps.signer,
            clock: deps.clock,
            timeout: DEFAULT_ACCESS_TIMEOUT,
        }
    }

    /// Replace the throttle policy.
    #[must_use]
    pub fn with_throttle(mut self, throttle: DistinctAddressThrottle) -> Self {
        self.limiter = RateLimiter::new(self.limiter.ledger(), throttle);
        self
    }

    /// Replace the request deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Steps up to and including signing. Nothing is written here.
    async fn authorise_and_sign(&self, request: &GetDownloadRequest) -> Result<Issued, Error> {
        let download_id = request.download_id;
        let download = self
            .downloads
            .find_by_id(&download_id)
            .await
            .map_err(|err| map_download_repository_error("load download", download_id, err))?
            .ok_or_else(|| Error::not_found(DOWNLOAD_NOT_FOUND))?;

        let order_id = download.order_id();
        let order = self
            .orders
            .find_by_id(&order_id)
            .await
            .map_err(|err| map_order_repository_error("load order", order_id, err))?
            .ok_or_else(|| {
                tracing::error!(%download_id, %order_id, "download references a missing order");
                Error::internal(format!(
                    "download {download_id} references missing order {order_id}"
                ))
            })?;

        authorise_order(&request.caller, &order, EntitlementSubject::Download)?;

        let now = self.clock.utc();
        self.limiter.check(order_id, now).await?;

        let signed_url = self.signer.sign(download.asset()).await.map_err(|err| {
            tracing::error!(%download_id, error = %err, "signing download failed");
            Error::internal(format!("Error signing download: {err}"))
        })?;

        Ok(Issued {
            download,
            signed_url,
            now,
        })
    }
}

/// A download cleared for access, signed but not yet recorded.
struct Issued {
    download: Download,
    signed_url: SignedUrl,
    now: DateTime<Utc>,
}

#[async_trait]
impl<D, O, L, A> DownloadAccessCommand for DownloadAccessService<D, O, L, A>
where
    D: DownloadRepository,
    O: OrderRepository,
    L: EventLedger,
    A: DownloadAuditRepository,
{
    async fn get_download(&self, request: GetDownloadRequest) -> Result<GetDownloadResponse, Error> {
        let download_id = request.download_id;
        let Issued {
            download,
            signed_url,
            now,
        } = tokio::time::timeout(self.timeout, self.authorise_and_sign(&request))
            .await
            .map_err(|_| {
                tracing::warn!(%download_id, timeout = ?self.timeout, "download access timed out");
                Error::internal(format!("download {download_id} access timed out"))
            })??;

        let committed = self
            .recorder
            .record_access(&download, request.caller.user_id(), &request.source_address, now)
            .await?;

        tracing::info!(
            %download_id,
            order_id = %download.order_id(),
            source_address = %request.source_address,
            download_count = committed,
            "download issued"
        );
        Ok(GetDownloadResponse {
            download: download
                .with_download_count(committed)
                .with_signed_url(signed_url),
        })
    }
}

#[cfg(test)]
#[path = "download_access_service_tests.rs"]
mod tests;
