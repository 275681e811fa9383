//! Shared HTTP adapter state.
//!
//! Handlers receive this through `web::Data` and depend only on the driving
//! ports, so they can be exercised without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    DownloadAccessCommand, DownloadRefreshCommand, DownloadsQuery, FixtureDownloadAccessCommand,
    FixtureDownloadRefreshCommand, FixtureDownloadsQuery,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub access: Arc<dyn DownloadAccessCommand>,
    pub listing: Arc<dyn DownloadsQuery>,
    pub refresh: Arc<dyn DownloadRefreshCommand>,
    /// Take the caller address from forwarding headers set by a trusted proxy.
    pub trust_forwarded: bool,
}

impl HttpState {
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use backend::domain::ports::{
    ///     FixtureDownloadAccessCommand, FixtureDownloadRefreshCommand, FixtureDownloadsQuery,
    /// };
    /// use backend::inbound::http::state::HttpState;
    ///
    /// let state = HttpState::new(
    ///     Arc::new(FixtureDownloadAccessCommand),
    ///     Arc::new(FixtureDownloadsQuery),
    ///     Arc::new(FixtureDownloadRefreshCommand),
    /// );
    /// let _listing = state.listing.clone();
    /// ```
    pub fn new(
        access: Arc<dyn DownloadAccessCommand>,
        listing: Arc<dyn DownloadsQuery>,
        refresh: Arc<dyn DownloadRefreshCommand>,
    ) -> Self {
        Self {
            access,
            listing,
            refresh,
            trust_forwarded: false,
        }
    }

    #[must_use]
    pub fn with_trusted_forwarding(mut self, trust_forwarded: bool) -> Self {
        self.trust_forwarded = trust_forwarded;
        self
    }

    /// State backed entirely by fixture ports.
    pub fn fixtures() -> Self {
        Self::new(
            Arc::new(FixtureDownloadAccessCommand),
            Arc::new(FixtureDownloadsQuery),
            Arc::new(FixtureDownloadRefreshCommand),
        )
    }
}
