//! Diesel adapters for the driven download ports.
//!
//! Each repository converts between private row structs (`models.rs`) and
//! domain types, and reports failures through its own port error. Queries run
//! on `diesel-async` connections borrowed from a shared [`DbPool`].
//!
//! ```ignore
//! use backend::outbound::persistence::{DbPool, DieselDownloadRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/downloads")).await?;
//! let downloads = DieselDownloadRepository::new(pool);
//! ```

mod diesel_basic_error_mapping;
mod diesel_download_audit_repository;
mod diesel_download_repository;
mod diesel_event_ledger;
mod diesel_order_repository;
mod models;
mod pool;
mod schema;

pub use diesel_download_audit_repository::DieselDownloadAuditRepository;
pub use diesel_download_repository::DieselDownloadRepository;
pub use diesel_event_ledger::DieselEventLedger;
pub use diesel_order_repository::DieselOrderRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
