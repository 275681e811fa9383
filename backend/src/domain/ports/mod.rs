//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`, [`EventLedger`], [`UrlSigner`],
//! [`DownloadCatalogue`]) are implemented by outbound adapters. Driving ports
//! ([`DownloadAccessCommand`], [`DownloadsQuery`], [`DownloadRefreshCommand`])
//! are implemented by domain services and consumed by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod download_access_command;
mod download_audit_repository;
mod download_catalogue;
mod download_refresh_command;
mod download_repository;
mod downloads_query;
mod event_ledger;
mod order_repository;
mod url_signer;

pub use download_access_command::{
    DownloadAccessCommand, FixtureDownloadAccessCommand, GetDownloadRequest, GetDownloadResponse,
};
#[cfg(test)]
pub use download_access_command::MockDownloadAccessCommand;
pub use download_audit_repository::{
    DownloadAccessRecord, DownloadAuditRepository, DownloadAuditRepositoryError,
    FixtureDownloadAuditRepository,
};
#[cfg(test)]
pub use download_audit_repository::MockDownloadAuditRepository;
pub use download_catalogue::{
    CatalogueDownload, DownloadCatalogue, DownloadCatalogueError, FixtureDownloadCatalogue,
};
#[cfg(test)]
pub use download_catalogue::MockDownloadCatalogue;
pub use download_refresh_command::{
    DownloadRefreshCommand, FixtureDownloadRefreshCommand, RefreshDownloadsRequest,
    RefreshDownloadsResponse,
};
#[cfg(test)]
pub use download_refresh_command::MockDownloadRefreshCommand;
pub use download_repository::{
    DownloadRepository, DownloadRepositoryError, DownloadScope, FixtureDownloadRepository,
};
#[cfg(test)]
pub use download_repository::MockDownloadRepository;
pub use downloads_query::{
    DownloadsQuery, FixtureDownloadsQuery, ListDownloadsRequest, ListDownloadsResponse,
};
#[cfg(test)]
pub use downloads_query::MockDownloadsQuery;
pub use event_ledger::{DistinctAddressQuery, EventLedger, EventLedgerError, FixtureEventLedger};
#[cfg(test)]
pub use event_ledger::MockEventLedger;
pub use order_repository::{FixtureOrderRepository, OrderRepository, OrderRepositoryError};
#[cfg(test)]
pub use order_repository::MockOrderRepository;
pub use url_signer::{FixtureUrlSigner, UrlSigner, UrlSignerError};
#[cfg(test)]
pub use url_signer::MockUrlSigner;
