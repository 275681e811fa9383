//! URL signing adapters.

mod sha256_url_signer;

pub use sha256_url_signer::{DEFAULT_SIGNED_URL_TTL, Sha256UrlSigner, SignatureError};
