//! Port for the external catalogue describing which files a product ships.

use async_trait::async_trait;

use crate::domain::{AssetReference, OrderLineItem};

use super::define_port_error;

define_port_error! {
    /// Errors raised by catalogue adapters.
    pub enum DownloadCatalogueError {
        /// The catalogue could not be reached.
        Transport { message: String } => "catalogue request failed: {message}",
        /// The catalogue answered with a non-success status.
        Status { status: u16, path: String } =>
            "catalogue returned status {status} for {path}",
        /// The catalogue payload could not be decoded.
        Decode { message: String } => "catalogue payload invalid: {message}",
        /// The request exceeded its deadline.
        Timeout { message: String } => "catalogue request timed out: {message}",
    }
}

/// A downloadable file the catalogue offers for one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogueDownload {
    pub title: String,
    pub format: Option<String>,
    pub asset: AssetReference,
}

/// Source of truth for the downloads attached to purchased products.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DownloadCatalogue: Send + Sync {
    /// Files currently offered for the line item's product.
    async fn downloads_for_line_item(
        &self,
        line_item: &OrderLineItem,
    ) -> Result<Vec<CatalogueDownload>, DownloadCatalogueError>;
}

/// Fixture catalogue offering nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureDownloadCatalogue;

#[async_trait]
impl DownloadCatalogue for FixtureDownloadCatalogue {
    async fn downloads_for_line_item(
        &self,
        _line_item: &OrderLineItem,
    ) -> Result<Vec<CatalogueDownload>, DownloadCatalogueError> {
        Ok(Vec::new())
    }
}
