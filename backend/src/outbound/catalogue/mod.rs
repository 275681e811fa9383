//! Catalogue outbound adapters.
//!
//! A thin HTTP implementation of the `DownloadCatalogue` port.

mod dto;
mod http_catalogue;

pub use http_catalogue::{HttpDownloadCatalogue, HttpDownloadCatalogueIdentity};
