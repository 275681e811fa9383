//! Port for the capability issuing time-bounded download URLs.

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use url::Url;

use crate::domain::{AssetReference, SignedUrl};

use super::define_port_error;

define_port_error! {
    /// Errors raised by URL signing adapters. Callers treat every variant
    /// as an opaque signing failure.
    pub enum UrlSignerError {
        /// The signing key or material could not be used.
        Key { message: String } => "signing key unavailable: {message}",
        /// The asset reference could not be turned into a URL.
        InvalidAsset { asset: String, message: String } =>
            "cannot sign asset {asset}: {message}",
    }
}

/// Produces a tamper-evident, expiring locator for an asset.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UrlSigner: Send + Sync {
    /// Sign the asset reference.
    async fn sign(&self, asset: &AssetReference) -> Result<SignedUrl, UrlSignerError>;
}

/// Fixture signer returning unsigned `fixture.invalid` links valid for an hour.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureUrlSigner;

#[async_trait]
impl UrlSigner for FixtureUrlSigner {
    async fn sign(&self, asset: &AssetReference) -> Result<SignedUrl, UrlSignerError> {
        let url = Url::parse("https://fixture.invalid/")
            .and_then(|base| base.join(asset.as_str()))
            .map_err(|err| UrlSignerError::invalid_asset(asset.as_str(), err.to_string()))?;
        Ok(SignedUrl {
            url,
            expires_at: Utc::now() + TimeDelta::hours(1),
        })
    }
}
