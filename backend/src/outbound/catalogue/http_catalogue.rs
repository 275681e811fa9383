//! Reqwest-backed catalogue adapter.
//!
//! Fetches `{base}{line_item.path}` as JSON and decodes the files a product
//! ships. Transport, status, and decode failures map onto
//! `DownloadCatalogueError`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use super::dto::ProductRecordDto;
use crate::domain::OrderLineItem;
use crate::domain::ports::{CatalogueDownload, DownloadCatalogue, DownloadCatalogueError};

const DEFAULT_USER_AGENT: &str = "downloads-backend-catalogue/0.1";

/// Outbound identity sent with catalogue requests.
pub struct HttpDownloadCatalogueIdentity {
    pub user_agent: String,
}

impl Default for HttpDownloadCatalogueIdentity {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

/// Catalogue adapter issuing one GET per line item.
pub struct HttpDownloadCatalogue {
    client: Client,
    base: Url,
    user_agent: String,
}

impl HttpDownloadCatalogue {
    /// Build an adapter whose requests fail after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        Self::with_identity(base, timeout, HttpDownloadCatalogueIdentity::default())
    }

    /// Build an adapter with an explicit outbound identity.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn with_identity(
        base: Url,
        timeout: Duration,
        identity: HttpDownloadCatalogueIdentity,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base,
            user_agent: identity.user_agent,
        })
    }

    fn product_url(&self, path: &str) -> Result<Url, DownloadCatalogueError> {
        let joined = format!(
            "{}/{}",
            self.base.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|err| {
            DownloadCatalogueError::transport(format!("invalid product path {path}: {err}"))
        })
    }
}

#[async_trait]
impl DownloadCatalogue for HttpDownloadCatalogue {
    async fn downloads_for_line_item(
        &self,
        line_item: &OrderLineItem,
    ) -> Result<Vec<CatalogueDownload>, DownloadCatalogueError> {
        let url = self.product_url(&line_item.path)?;
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, self.user_agent.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(map_status_error(status, &line_item.path));
        }
        let body = response.bytes().await.map_err(map_transport_error)?;

        let downloads = parse_downloads(body.as_ref(), line_item)?;
        debug!(
            path = %line_item.path,
            offered = downloads.len(),
            "catalogue product fetched"
        );
        Ok(downloads)
    }
}

fn parse_downloads(
    body: &[u8],
    line_item: &OrderLineItem,
) -> Result<Vec<CatalogueDownload>, DownloadCatalogueError> {
    let decoded: ProductRecordDto = serde_json::from_slice(body).map_err(|error| {
        DownloadCatalogueError::decode(format!("invalid product JSON payload: {error}"))
    })?;
    decoded
        .into_catalogue_downloads(line_item)
        .map_err(DownloadCatalogueError::decode)
}

fn map_transport_error(error: reqwest::Error) -> DownloadCatalogueError {
    if error.is_timeout() {
        DownloadCatalogueError::timeout(error.to_string())
    } else {
        DownloadCatalogueError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, path: &str) -> DownloadCatalogueError {
    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            DownloadCatalogueError::timeout(format!("status {} for {path}", status.as_u16()))
        }
        _ => DownloadCatalogueError::status(status.as_u16(), path),
    }
}
