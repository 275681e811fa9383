//! HMAC-SHA256 signer for asset download links.
//!
//! A signed link has the shape
//! `{asset_base}/{asset}?expires=<unix seconds>&signature=<hex digest>`,
//! where the digest is the HMAC of `{path}\n{expires}` under the shared
//! secret.
//! Asset hosts holding the same secret validate links with
//! [`Sha256UrlSigner::verify`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use sha2::{Digest, Sha256};
use tracing::debug;
use url::Url;
use zeroize::Zeroizing;

use crate::domain::ports::{UrlSigner, UrlSignerError};
use crate::domain::{AssetReference, SignedUrl};

/// Lifetime of a signed link unless overridden.
pub const DEFAULT_SIGNED_URL_TTL: TimeDelta = TimeDelta::minutes(15);

const EXPIRES_PARAM: &str = "expires";
const SIGNATURE_PARAM: &str = "signature";

/// Reasons a presented link is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("signed URL is missing the {param} parameter")]
    MissingParameter { param: &'static str },
    #[error("signed URL expiry is not a valid timestamp")]
    MalformedExpiry,
    #[error("signed URL expired at {expires_at}")]
    Expired { expires_at: DateTime<Utc> },
    #[error("signed URL signature does not match")]
    Mismatch,
}

/// Signs asset references beneath a base URL with a shared secret.
pub struct Sha256UrlSigner {
    secret: Zeroizing<Vec<u8>>,
    asset_base: Url,
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for Sha256UrlSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sha256UrlSigner")
            .field("asset_base", &self.asset_base.as_str())
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl Sha256UrlSigner {
    /// Build a signer.
    ///
    /// # Errors
    ///
    /// Returns [`UrlSignerError::Key`] when the secret is empty or the base
    /// URL cannot carry a path.
    pub fn new(
        secret: Zeroizing<Vec<u8>>,
        asset_base: Url,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, UrlSignerError> {
        if secret.is_empty() {
            return Err(UrlSignerError::key("signing secret is empty"));
        }
        if asset_base.cannot_be_a_base() {
            return Err(UrlSignerError::key(format!(
                "asset base {asset_base} cannot carry a path"
            )));
        }
        Ok(Self {
            secret,
            asset_base: with_trailing_slash(asset_base),
            ttl: DEFAULT_SIGNED_URL_TTL,
            clock,
        })
    }

    /// Override how long issued links stay valid.
    #[must_use]
    pub fn with_ttl(mut self, ttl: TimeDelta) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    fn signature(&self, path: &str, expires: i64) -> String {
        let message = format!("{path}\n{expires}");
        hex::encode(hmac_sha256(&self.secret, message.as_bytes()))
    }

    /// Check a link previously issued by a signer sharing this secret.
    ///
    /// # Errors
    ///
    /// Returns a [`SignatureError`] describing why the link is not honoured.
    pub fn verify(&self, url: &Url, now: DateTime<Utc>) -> Result<(), SignatureError> {
        let mut expires = None;
        let mut signature = None;
        for (name, value) in url.query_pairs() {
            match name.as_ref() {
                EXPIRES_PARAM => expires = Some(value.into_owned()),
                SIGNATURE_PARAM => signature = Some(value.into_owned()),
                _ => {}
            }
        }

        let expires = expires.ok_or(SignatureError::MissingParameter {
            param: EXPIRES_PARAM,
        })?;
        let signature = signature.ok_or(SignatureError::MissingParameter {
            param: SIGNATURE_PARAM,
        })?;
        let expires: i64 = expires
            .parse()
            .map_err(|_| SignatureError::MalformedExpiry)?;
        let expires_at =
            DateTime::from_timestamp(expires, 0).ok_or(SignatureError::MalformedExpiry)?;

        let expected = self.signature(url.path(), expires);
        if !constant_time_eq(expected.as_bytes(), signature.as_bytes()) {
            return Err(SignatureError::Mismatch);
        }
        if now >= expires_at {
            return Err(SignatureError::Expired { expires_at });
        }
        Ok(())
    }
}

#[async_trait]
impl UrlSigner for Sha256UrlSigner {
    async fn sign(&self, asset: &AssetReference) -> Result<SignedUrl, UrlSignerError> {
        let relative = asset.as_str().trim_start_matches('/');
        let mut url = self
            .asset_base
            .join(relative)
            .map_err(|err| UrlSignerError::invalid_asset(asset.as_str(), err.to_string()))?;
        if !url.path().starts_with(self.asset_base.path()) {
            return Err(UrlSignerError::invalid_asset(
                asset.as_str(),
                "asset escapes the asset base",
            ));
        }

        // Whole seconds so the expiry survives the round trip through the query.
        let expires = (self.clock.utc() + self.ttl).timestamp();
        let expires_at = DateTime::from_timestamp(expires, 0)
            .ok_or_else(|| UrlSignerError::key("expiry outside the representable range"))?;
        let signature = self.signature(url.path(), expires);

        url.set_query(None);
        url.set_fragment(None);
        url.query_pairs_mut()
            .append_pair(EXPIRES_PARAM, &expires.to_string())
            .append_pair(SIGNATURE_PARAM, &signature);

        debug!(asset = asset.as_str(), %expires_at, "asset link signed");
        Ok(SignedUrl { url, expires_at })
    }
}

fn with_trailing_slash(mut base: Url) -> Url {
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

const SHA256_BLOCK: usize = 64;
const IPAD: u8 = 0x36;
const OPAD: u8 = 0x5c;

/// HMAC-SHA256 (RFC 2104) of `message` under `key`.
fn hmac_sha256(key: &[u8], message: &[u8]) -> [u8; 32] {
    let mut block = Zeroizing::new([0_u8; SHA256_BLOCK]);
    if key.len() > SHA256_BLOCK {
        let digest = Sha256::digest(key);
        block[..digest.len()].copy_from_slice(&digest);
    } else {
        block[..key.len()].copy_from_slice(key);
    }

    let mut pad = Zeroizing::new([0_u8; SHA256_BLOCK]);
    for (out, byte) in pad.iter_mut().zip(block.iter()) {
        *out = byte ^ IPAD;
    }
    let inner = Sha256::new()
        .chain_update(pad.as_slice())
        .chain_update(message)
        .finalize();

    for (out, byte) in pad.iter_mut().zip(block.iter()) {
        *out = byte ^ OPAD;
    }
    Sha256::new()
        .chain_update(pad.as_slice())
        .chain_update(inner)
        .finalize()
        .into()
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .zip(right)
            .fold(0_u8, |acc, (l, r)| acc | (l ^ r))
            == 0
}
