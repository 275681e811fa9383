//! Server configuration loaded via OrthoConfig.
//!
//! Every field can be supplied as a `DOWNLOADS_*` environment variable, a
//! command-line flag, or a configuration file key. Accessors apply defaults.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::TimeDelta;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;
use zeroize::{Zeroize, Zeroizing};

use crate::domain::{
    DEFAULT_ACCESS_TIMEOUT, DEFAULT_MAX_DISTINCT_ADDRESSES, DEFAULT_WINDOW_HOURS,
    DistinctAddressThrottle,
};
use crate::outbound::persistence::PoolConfig;
use crate::outbound::signing::DEFAULT_SIGNED_URL_TTL;

const DEFAULT_BIND_ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8080);
const DEFAULT_SESSION_KEY_PATH: &str = "/var/run/secrets/session_key";
const DEFAULT_SIGNING_SECRET_PATH: &str = "/var/run/secrets/download_signing_key";
const DEFAULT_POOL_MAX_SIZE: u32 = 10;
const DEFAULT_CATALOGUE_TIMEOUT_SECS: u64 = 10;

/// Minimum accepted length for the session key file.
pub const SESSION_KEY_MIN_LEN: usize = 64;
/// Minimum accepted length for the URL signing secret.
pub const SIGNING_SECRET_MIN_LEN: usize = 32;

/// Errors raised while resolving configured values.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A secret file could not be read.
    #[error("failed to read secret at {path}: {source}")]
    SecretRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A secret file is shorter than required.
    #[error("secret at {path} too short: need >= {min_len} bytes, got {length}")]
    SecretTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    /// A value needed by the database-backed wiring is absent.
    #[error("{name} must be set when a database URL is configured")]
    Missing { name: &'static str },
}

/// Configuration for the downloads server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "DOWNLOADS")]
pub struct DownloadServerSettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<SocketAddr>,
    /// PostgreSQL connection URL. Absent means fixture ports.
    pub database_url: Option<String>,
    /// Maximum pooled connections.
    pub pool_max_size: Option<u32>,
    /// File holding the cookie session key shared with the login service.
    pub session_key_file: Option<PathBuf>,
    /// Mark session cookies `Secure`. Defaults to on.
    pub cookie_secure: Option<bool>,
    /// File holding the URL signing secret.
    pub signing_secret_file: Option<PathBuf>,
    /// Base URL signed asset links are issued under.
    pub asset_base_url: Option<Url>,
    /// Lifetime of an issued link, in seconds.
    pub signed_url_ttl_secs: Option<u64>,
    /// Base URL of the product catalogue.
    pub catalogue_base_url: Option<Url>,
    /// Catalogue request timeout, in seconds.
    pub catalogue_timeout_secs: Option<u64>,
    /// Deadline for a single download access, in seconds.
    pub request_timeout_secs: Option<u64>,
    /// Trailing window for the distinct address throttle, in hours.
    pub throttle_window_hours: Option<i64>,
    /// Distinct addresses tolerated within the window.
    pub throttle_max_addresses: Option<u64>,
    /// Honour `Forwarded`/`X-Forwarded-For` from a trusted proxy. Defaults to off.
    pub trust_forwarded_for: Option<bool>,
}

impl DownloadServerSettings {
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr.unwrap_or(DEFAULT_BIND_ADDR)
    }

    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure.unwrap_or(true)
    }

    pub fn trust_forwarded_for(&self) -> bool {
        self.trust_forwarded_for.unwrap_or(false)
    }

    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Pool configuration for the configured database, if any.
    pub fn pool_config(&self) -> Option<PoolConfig> {
        let limit = self.pool_max_size.unwrap_or(DEFAULT_POOL_MAX_SIZE);
        self.database_url()
            .map(|url| PoolConfig::new(url).max_connections(limit))
    }

    pub fn session_key_file(&self) -> PathBuf {
        self.session_key_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_KEY_PATH))
    }

    pub fn signing_secret_file(&self) -> PathBuf {
        self.signing_secret_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SIGNING_SECRET_PATH))
    }

    pub fn signed_url_ttl(&self) -> TimeDelta {
        self.signed_url_ttl_secs
            .and_then(|secs| i64::try_from(secs).ok())
            .map(TimeDelta::seconds)
            .unwrap_or(DEFAULT_SIGNED_URL_TTL)
    }

    pub fn catalogue_timeout(&self) -> Duration {
        Duration::from_secs(
            self.catalogue_timeout_secs
                .unwrap_or(DEFAULT_CATALOGUE_TIMEOUT_SECS),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_ACCESS_TIMEOUT)
    }

    /// Throttle policy built from the window and limit settings.
    pub fn throttle(&self) -> DistinctAddressThrottle {
        DistinctAddressThrottle::new(
            TimeDelta::hours(self.throttle_window_hours.unwrap_or(DEFAULT_WINDOW_HOURS)),
            self.throttle_max_addresses
                .unwrap_or(DEFAULT_MAX_DISTINCT_ADDRESSES),
        )
    }

    /// Asset base URL, required once a database is configured.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Missing`] when unset.
    pub fn require_asset_base_url(&self) -> Result<&Url, SettingsError> {
        self.asset_base_url.as_ref().ok_or(SettingsError::Missing {
            name: "DOWNLOADS_ASSET_BASE_URL",
        })
    }

    /// Catalogue base URL, required once a database is configured.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Missing`] when unset.
    pub fn require_catalogue_base_url(&self) -> Result<&Url, SettingsError> {
        self.catalogue_base_url
            .as_ref()
            .ok_or(SettingsError::Missing {
                name: "DOWNLOADS_CATALOGUE_BASE_URL",
            })
    }

    /// Read the URL signing secret.
    ///
    /// # Errors
    ///
    /// Fails when the file is unreadable or shorter than
    /// [`SIGNING_SECRET_MIN_LEN`].
    pub fn signing_secret(&self) -> Result<Zeroizing<Vec<u8>>, SettingsError> {
        read_secret_file(&self.signing_secret_file(), SIGNING_SECRET_MIN_LEN)
    }
}

/// Read a secret file, rejecting contents shorter than `min_len`.
///
/// The buffer is zeroed on drop, including on the rejection path.
///
/// # Errors
///
/// Returns [`SettingsError::SecretRead`] or [`SettingsError::SecretTooShort`].
pub fn read_secret_file(path: &Path, min_len: usize) -> Result<Zeroizing<Vec<u8>>, SettingsError> {
    let mut bytes = std::fs::read(path).map_err(|source| SettingsError::SecretRead {
        path: path.to_path_buf(),
        source,
    })?;
    let length = bytes.len();
    if length < min_len {
        bytes.zeroize();
        return Err(SettingsError::SecretTooShort {
            path: path.to_path_buf(),
            length,
            min_len,
        });
    }
    Ok(Zeroizing::new(bytes))
}
