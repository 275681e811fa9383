//! Distinct source address throttle.
//!
//! A heuristic abuse control: once more than `max_distinct_addresses`
//! different addresses have downloaded from an order within the trailing
//! window, further downloads are refused. Concurrent requests may both pass a
//! check at the limit; over-admission of that kind is accepted.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};

use super::ports::{DistinctAddressQuery, EventLedger, EventLedgerError};
use super::{DOWNLOAD_CHANGE, Error, OrderId};

/// Default trailing window.
pub const DEFAULT_WINDOW_HOURS: i64 = 24;

/// Default number of distinct addresses tolerated within the window.
pub const DEFAULT_MAX_DISTINCT_ADDRESSES: u64 = 50;

/// Message returned when the throttle denies access.
pub const THROTTLED_MESSAGE: &str =
    "This download has been accessed from too many IPs within the last day";

/// Throttle policy.
///
/// # Examples
/// ```
/// use backend::domain::DistinctAddressThrottle;
///
/// let throttle = DistinctAddressThrottle::default();
/// assert!(throttle.admits(50));
/// assert!(!throttle.admits(51));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistinctAddressThrottle {
    window: TimeDelta,
    max_distinct_addresses: u64,
}

impl DistinctAddressThrottle {
    pub fn new(window: TimeDelta, max_distinct_addresses: u64) -> Self {
        Self {
            window,
            max_distinct_addresses,
        }
    }

    pub fn window_length(&self) -> TimeDelta {
        self.window
    }

    pub fn max_distinct_addresses(&self) -> u64 {
        self.max_distinct_addresses
    }

    /// The half-open interval `(now - window, now]` as `(since, until)`.
    pub fn window(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        (now - self.window, now)
    }

    /// Whether `count` distinct addresses is still acceptable.
    pub fn admits(&self, count: u64) -> bool {
        count <= self.max_distinct_addresses
    }
}

impl Default for DistinctAddressThrottle {
    fn default() -> Self {
        Self::new(
            TimeDelta::hours(DEFAULT_WINDOW_HOURS),
            DEFAULT_MAX_DISTINCT_ADDRESSES,
        )
    }
}

fn map_ledger_error(order_id: OrderId, error: EventLedgerError) -> Error {
    tracing::error!(%order_id, error = %error, "counting distinct download addresses failed");
    Error::internal(format!(
        "counting download addresses for order {order_id} failed: {error}"
    ))
}

/// Applies a [`DistinctAddressThrottle`] against the event ledger.
pub struct RateLimiter<L> {
    ledger: Arc<L>,
    throttle: DistinctAddressThrottle,
}

impl<L> Clone for RateLimiter<L> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            throttle: self.throttle,
        }
    }
}

impl<L> RateLimiter<L>
where
    L: EventLedger,
{
    pub fn new(ledger: Arc<L>, throttle: DistinctAddressThrottle) -> Self {
        Self { ledger, throttle }
    }

    pub fn throttle(&self) -> DistinctAddressThrottle {
        self.throttle
    }

    pub(crate) fn ledger(&self) -> Arc<L> {
        Arc::clone(&self.ledger)
    }

    /// Distinct addresses with download-tagged entries for the order within
    /// the window ending at `now`.
    pub async fn count_distinct_access_addresses(
        &self,
        order_id: OrderId,
        now: DateTime<Utc>,
    ) -> Result<u64, Error> {
        let (since, until) = self.throttle.window(now);
        self.ledger
            .count_distinct_addresses(&DistinctAddressQuery {
                order_id,
                change: DOWNLOAD_CHANGE.to_owned(),
                since,
                until,
            })
            .await
            .map_err(|err| map_ledger_error(order_id, err))
    }

    /// Deny with `Unauthorized` when the order exceeds the throttle.
    pub async fn check(&self, order_id: OrderId, now: DateTime<Utc>) -> Result<(), Error> {
        let count = self.count_distinct_access_addresses(order_id, now).await?;
        if self.throttle.admits(count) {
            return Ok(());
        }
        tracing::warn!(
            %order_id,
            distinct_addresses = count,
            limit = self.throttle.max_distinct_addresses(),
            window_hours = self.throttle.window_length().num_hours(),
            "download throttled"
        );
        Err(Error::unauthorized(THROTTLED_MESSAGE))
    }
}
