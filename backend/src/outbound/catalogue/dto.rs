//! DTOs for decoding product records served by the catalogue.

use serde::Deserialize;

use crate::domain::ports::CatalogueDownload;
use crate::domain::{AssetReference, OrderLineItem};

#[derive(Debug, Deserialize)]
pub(super) struct ProductRecordDto {
    #[serde(default)]
    pub(super) downloads: Vec<ProductDownloadDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ProductDownloadDto {
    #[serde(default)]
    pub(super) title: Option<String>,
    pub(super) url: String,
    #[serde(default)]
    pub(super) format: Option<String>,
}

impl ProductRecordDto {
    /// Map every offered file, naming untitled files after the line item.
    pub(super) fn into_catalogue_downloads(
        self,
        line_item: &OrderLineItem,
    ) -> Result<Vec<CatalogueDownload>, String> {
        self.downloads
            .into_iter()
            .enumerate()
            .map(|(index, dto)| dto.into_catalogue_download(index, line_item))
            .collect()
    }
}

impl ProductDownloadDto {
    fn into_catalogue_download(
        self,
        index: usize,
        line_item: &OrderLineItem,
    ) -> Result<CatalogueDownload, String> {
        let asset = AssetReference::new(&self.url)
            .map_err(|err| format!("download {index} of {}: {err}", line_item.path))?;
        let title = self
            .title
            .map(|title| title.trim().to_owned())
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| line_item.title.clone());
        let format = self
            .format
            .map(|format| format.trim().to_owned())
            .filter(|format| !format.is_empty());

        Ok(CatalogueDownload {
            title,
            format,
            asset,
        })
    }
}
