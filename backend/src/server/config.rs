//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use actix_web::cookie::{Key, SameSite};
use backend::domain::ports::UrlSigner;
use backend::domain::{DEFAULT_ACCESS_TIMEOUT, DistinctAddressThrottle};
use backend::outbound::catalogue::HttpDownloadCatalogue;
use backend::outbound::persistence::DbPool;

/// Adapters used when the server runs against a real database.
#[derive(Clone)]
pub struct DownloadBackends {
    pub pool: DbPool,
    pub signer: Arc<dyn UrlSigner>,
    pub catalogue: Arc<HttpDownloadCatalogue>,
}

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) backends: Option<DownloadBackends>,
    pub(crate) throttle: DistinctAddressThrottle,
    pub(crate) request_timeout: Duration,
    pub(crate) trust_forwarded: bool,
}

impl ServerConfig {
    #[must_use]
    pub fn new(key: Key, cookie_secure: bool, same_site: SameSite, bind_addr: SocketAddr) -> Self {
        Self {
            key,
            cookie_secure,
            same_site,
            bind_addr,
            backends: None,
            throttle: DistinctAddressThrottle::default(),
            request_timeout: DEFAULT_ACCESS_TIMEOUT,
            trust_forwarded: false,
        }
    }

    /// Attach database-backed adapters.
    ///
    /// Without them every driving port is served by its fixture.
    #[must_use]
    pub fn with_backends(mut self, backends: DownloadBackends) -> Self {
        self.backends = Some(backends);
        self
    }

    #[must_use]
    pub fn with_throttle(mut self, throttle: DistinctAddressThrottle) -> Self {
        self.throttle = throttle;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_trusted_forwarding(mut self, trust_forwarded: bool) -> Self {
        self.trust_forwarded = trust_forwarded;
        self
    }
}
