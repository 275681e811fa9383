//! Purchased downloads and their ephemeral signed locators.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use super::OrderId;

/// Identifier of a purchased download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DownloadId(Uuid);

impl DownloadId {
    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for DownloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validation errors raised when constructing download values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DownloadValidationError {
    /// The asset reference was blank.
    #[error("asset reference must not be empty")]
    EmptyAsset,
    /// The download title was blank.
    #[error("download title must not be empty")]
    EmptyTitle,
}

/// Opaque reference to a stored asset, handed to the URL signer.
///
/// # Examples
/// ```
/// use backend::domain::AssetReference;
///
/// let asset = AssetReference::new(" books/rust.pdf ").expect("asset");
/// assert_eq!(asset.as_str(), "books/rust.pdf");
/// assert!(AssetReference::new("  ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetReference(String);

impl AssetReference {
    /// Trim and validate an asset reference.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, DownloadValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(DownloadValidationError::EmptyAsset);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the reference.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for AssetReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<AssetReference> for String {
    fn from(value: AssetReference) -> Self {
        value.0
    }
}

impl TryFrom<String> for AssetReference {
    type Error = DownloadValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Time-bounded locator issued by a URL signer. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUrl {
    pub url: Url,
    pub expires_at: DateTime<Utc>,
}

/// Input for constructing a [`Download`].
#[derive(Debug, Clone)]
pub struct DownloadDraft {
    pub id: DownloadId,
    pub order_id: OrderId,
    pub line_item_id: Option<Uuid>,
    pub title: String,
    pub format: Option<String>,
    pub asset: AssetReference,
    pub download_count: u64,
    pub created_at: DateTime<Utc>,
}

/// A purchased asset attached to an order.
///
/// ## Invariants
/// - `title` is non-empty once trimmed.
/// - `download_count` only grows, and only through the audit recorder.
/// - `signed_url` is populated for a single response and never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    id: DownloadId,
    order_id: OrderId,
    line_item_id: Option<Uuid>,
    title: String,
    format: Option<String>,
    asset: AssetReference,
    download_count: u64,
    created_at: DateTime<Utc>,
    signed_url: Option<SignedUrl>,
}

impl Download {
    /// Validate a draft into a download without a signed URL.
    pub fn new(draft: DownloadDraft) -> Result<Self, DownloadValidationError> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(DownloadValidationError::EmptyTitle);
        }
        Ok(Self {
            id: draft.id,
            order_id: draft.order_id,
            line_item_id: draft.line_item_id,
            title: title.to_owned(),
            format: draft.format.filter(|value| !value.trim().is_empty()),
            asset: draft.asset,
            download_count: draft.download_count,
            created_at: draft.created_at,
            signed_url: None,
        })
    }

    pub fn id(&self) -> DownloadId {
        self.id
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn line_item_id(&self) -> Option<Uuid> {
        self.line_item_id
    }

    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    pub fn asset(&self) -> &AssetReference {
        &self.asset
    }

    pub fn download_count(&self) -> u64 {
        self.download_count
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn signed_url(&self) -> Option<&SignedUrl> {
        self.signed_url.as_ref()
    }

    /// Attach a freshly issued locator.
    #[must_use]
    pub fn with_signed_url(mut self, signed_url: SignedUrl) -> Self {
        self.signed_url = Some(signed_url);
        self
    }

    /// Replace the counter with the value committed by the store.
    #[must_use]
    pub fn with_download_count(mut self, download_count: u64) -> Self {
        self.download_count = download_count;
        self
    }

    /// Refresh catalogue metadata while keeping identity and counter.
    #[must_use]
    pub(crate) fn with_catalogue_metadata(mut self, title: String, asset: AssetReference) -> Self {
        self.title = title;
        self.asset = asset;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn draft() -> DownloadDraft {
        DownloadDraft {
            id: DownloadId::random(),
            order_id: OrderId::random(),
            line_item_id: None,
            title: "  Field guide ".to_owned(),
            format: Some("pdf".to_owned()),
            asset: AssetReference::new("guides/field.pdf").expect("asset"),
            download_count: 3,
            created_at: Utc::now(),
        }
    }

    #[rstest]
    fn new_trims_title_and_starts_unsigned(draft: DownloadDraft) {
        let download = Download::new(draft).expect("valid download");
        assert_eq!(download.title(), "Field guide");
        assert!(download.signed_url().is_none());
    }

    #[rstest]
    fn blank_title_is_rejected(mut draft: DownloadDraft) {
        draft.title = "   ".to_owned();
        assert_eq!(
            Download::new(draft),
            Err(DownloadValidationError::EmptyTitle)
        );
    }

    #[rstest]
    fn blank_format_is_dropped(mut draft: DownloadDraft) {
        draft.format = Some(" ".to_owned());
        let download = Download::new(draft).expect("valid download");
        assert!(download.format().is_none());
    }

    #[rstest]
    fn signed_url_and_counter_are_attached(draft: DownloadDraft) {
        let expires_at = Utc::now();
        let url = Url::parse("https://assets.example.com/guides/field.pdf").expect("url");
        let download = Download::new(draft)
            .expect("valid download")
            .with_signed_url(SignedUrl {
                url: url.clone(),
                expires_at,
            })
            .with_download_count(4);

        assert_eq!(download.download_count(), 4);
        assert_eq!(
            download.signed_url().map(|signed| &signed.url),
            Some(&url)
        );
    }
}
