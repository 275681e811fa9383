//! Port for reading the append-only event ledger.
//!
//! Appends happen only through [`super::DownloadAuditRepository`], inside the
//! same unit of work that bumps a download counter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Event, OrderId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by event ledger adapters.
    pub enum EventLedgerError {
        /// Ledger connection could not be established.
        Connection { message: String } =>
            "event ledger connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } =>
            "event ledger query failed: {message}",
    }
}

/// Parameters for a distinct source address count.
///
/// The window is half-open: entries at exactly `since` are excluded, entries
/// at exactly `until` are included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistinctAddressQuery {
    pub order_id: OrderId,
    pub change: String,
    pub since: DateTime<Utc>,
    pub until: DateTime<Utc>,
}

impl DistinctAddressQuery {
    /// Whether a timestamp falls inside `(since, until]`.
    pub fn covers(&self, at: DateTime<Utc>) -> bool {
        at > self.since && at <= self.until
    }
}

/// Read side of the ledger.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventLedger: Send + Sync {
    /// Count distinct source addresses among entries for the order carrying
    /// the change tag within the query window.
    async fn count_distinct_addresses(
        &self,
        query: &DistinctAddressQuery,
    ) -> Result<u64, EventLedgerError>;

    /// Read an order's entries oldest first.
    async fn list_for_order(&self, order_id: &OrderId) -> Result<Vec<Event>, EventLedgerError>;
}

/// Fixture ledger that is always empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureEventLedger;

#[async_trait]
impl EventLedger for FixtureEventLedger {
    async fn count_distinct_addresses(
        &self,
        _query: &DistinctAddressQuery,
    ) -> Result<u64, EventLedgerError> {
        Ok(0)
    }

    async fn list_for_order(&self, _order_id: &OrderId) -> Result<Vec<Event>, EventLedgerError> {
        Ok(Vec::new())
    }
}
