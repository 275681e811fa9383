//! Shared `bb8` pool of `diesel-async` PostgreSQL connections.
//!
//! Repositories hold a cloned [`DbPool`] and turn a [`PoolError`] into the
//! connection variant of their own port error.

use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};

/// Connection handed out by [`DbPool::get`].
pub type PgConnection<'a> = PooledConnection<'a, AsyncPgConnection>;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const IDLE_FLOOR: u32 = 2;
const DEFAULT_CHECKOUT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("no database connection available: {message}")]
    Checkout { message: String },
    #[error("database pool could not start: {message}")]
    Build { message: String },
}

impl PoolError {
    pub fn checkout(cause: impl ToString) -> Self {
        Self::Checkout {
            message: cause.to_string(),
        }
    }

    pub fn build(cause: impl ToString) -> Self {
        Self::Build {
            message: cause.to_string(),
        }
    }
}

/// Sizing for [`DbPool`].
///
/// ```
/// use std::time::Duration;
/// use backend::outbound::persistence::PoolConfig;
///
/// let config = PoolConfig::new("postgres://localhost/downloads")
///     .max_connections(16)
///     .checkout_timeout(Duration::from_secs(5));
/// assert_eq!(config.connection_limit(), 16);
/// ```
#[derive(Debug, Clone)]
pub struct PoolConfig {
    url: String,
    limit: u32,
    checkout_timeout: Duration,
}

impl PoolConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            limit: DEFAULT_MAX_CONNECTIONS,
            checkout_timeout: DEFAULT_CHECKOUT_TIMEOUT,
        }
    }

    /// Upper bound on open connections; zero is raised to one.
    #[must_use]
    pub fn max_connections(self, limit: u32) -> Self {
        Self {
            limit: limit.max(1),
            ..self
        }
    }

    #[must_use]
    pub fn checkout_timeout(self, checkout_timeout: Duration) -> Self {
        Self {
            checkout_timeout,
            ..self
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn connection_limit(&self) -> u32 {
        self.limit
    }

    fn idle_connections(&self) -> u32 {
        IDLE_FLOOR.min(self.limit)
    }
}

/// Cloneable handle to the shared connection pool.
#[derive(Clone)]
pub struct DbPool {
    inner: Pool<AsyncPgConnection>,
}

impl DbPool {
    /// Open the pool and its idle connections.
    ///
    /// # Errors
    ///
    /// [`PoolError::Build`] when the URL is rejected or the server is unreachable.
    pub async fn new(config: PoolConfig) -> Result<Self, PoolError> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.url());
        let inner = Pool::builder()
            .max_size(config.connection_limit())
            .min_idle(Some(config.idle_connections()))
            .connection_timeout(config.checkout_timeout)
            .build(manager)
            .await
            .map_err(PoolError::build)?;

        tracing::info!(
            connections = config.connection_limit(),
            "database pool ready"
        );
        Ok(Self { inner })
    }

    /// # Errors
    ///
    /// [`PoolError::Checkout`] when the checkout timeout elapses first.
    pub async fn get(&self) -> Result<PgConnection<'_>, PoolError> {
        self.inner.get().await.map_err(PoolError::checkout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn unconfigured_pool_uses_defaults() {
        let config = PoolConfig::new("postgres://db.internal/downloads");

        assert_eq!(config.url(), "postgres://db.internal/downloads");
        assert_eq!(config.connection_limit(), DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.idle_connections(), IDLE_FLOOR);
        assert_eq!(config.checkout_timeout, DEFAULT_CHECKOUT_TIMEOUT);
    }

    #[rstest]
    #[case(0, 1, 1)]
    #[case(1, 1, 1)]
    #[case(25, 25, 2)]
    fn limit_bounds_idle_connections(
        #[case] requested: u32,
        #[case] limit: u32,
        #[case] idle: u32,
    ) {
        let config = PoolConfig::new("postgres://db.internal/downloads").max_connections(requested);

        assert_eq!(config.connection_limit(), limit);
        assert_eq!(config.idle_connections(), idle);
    }

    #[rstest]
    fn pool_errors_keep_the_cause() {
        let checkout = PoolError::checkout("connection refused");
        let build = PoolError::build("invalid URL");

        assert!(checkout.to_string().ends_with("connection refused"));
        assert!(build.to_string().ends_with("invalid URL"));
    }
}
