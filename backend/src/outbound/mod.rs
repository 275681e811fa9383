//! Outbound adapters implementing the driven ports.
//!
//! - **persistence**: PostgreSQL repositories, ledger, and audit writer
//! - **signing**: keyed SHA-256 download link signer
//! - **catalogue**: HTTP client for the product catalogue
//!
//! Adapters translate between domain types and infrastructure
//! representations. They contain no business logic.

pub mod catalogue;
pub mod persistence;
pub mod signing;
