//! Append-only ledger entries recorded against orders.
//!
//! Events are never mutated or deleted once written. The distinct-address
//! throttle reads them back, so the change tag and source address recorded
//! for each download access matter.

use std::collections::BTreeSet;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{OrderId, UserId};

/// Change tag recorded for every successful download access.
pub const DOWNLOAD_CHANGE: &str = "download";

/// Maximum stored length of a source address.
pub const MAX_SOURCE_ADDRESS_LEN: usize = 64;

/// What happened to the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Created,
    Updated,
    Deleted,
}

impl EventKind {
    /// Stable storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        }
    }
}

/// Error returned when parsing an unknown event kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event kind: {0}")]
pub struct ParseEventKindError(pub String);

impl FromStr for EventKind {
    type Err = ParseEventKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "updated" => Ok(Self::Updated),
            "deleted" => Ok(Self::Deleted),
            other => Err(ParseEventKindError(other.to_owned())),
        }
    }
}

/// Network address a request arrived from.
///
/// Kept as text so the ledger can hold whatever the transport reported,
/// including the `unknown` placeholder when no peer address is available.
///
/// # Examples
/// ```
/// use std::net::{IpAddr, Ipv4Addr};
/// use backend::domain::SourceAddress;
///
/// let address = SourceAddress::from(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7)));
/// assert_eq!(address.as_str(), "203.0.113.7");
/// assert_eq!(SourceAddress::unknown().as_str(), "unknown");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceAddress(String);

impl SourceAddress {
    /// Placeholder used when the transport reports no address.
    pub fn unknown() -> Self {
        Self("unknown".to_owned())
    }

    /// Wrap a raw address, truncating to the stored width.
    ///
    /// Blank input collapses to [`SourceAddress::unknown`].
    pub fn from_raw(raw: impl AsRef<str>) -> Self {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Self::unknown();
        }
        Self(trimmed.chars().take(MAX_SOURCE_ADDRESS_LEN).collect())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<IpAddr> for SourceAddress {
    fn from(value: IpAddr) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for SourceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ledger entry waiting to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub order_id: OrderId,
    /// `None` for anonymous callers.
    pub actor: Option<UserId>,
    pub source_address: SourceAddress,
    pub kind: EventKind,
    pub changes: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

impl NewEvent {
    /// Build the entry recorded for a single download access.
    pub fn download_access(
        order_id: OrderId,
        actor: Option<UserId>,
        source_address: SourceAddress,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            order_id,
            actor,
            source_address,
            kind: EventKind::Updated,
            changes: BTreeSet::from([DOWNLOAD_CHANGE.to_owned()]),
            created_at,
        }
    }

    /// Whether the entry carries the given change tag.
    pub fn has_change(&self, change: &str) -> bool {
        self.changes.contains(change)
    }
}

/// Ledger entry as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: Uuid,
    pub order_id: OrderId,
    pub actor: Option<UserId>,
    pub source_address: SourceAddress,
    pub kind: EventKind,
    pub changes: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Materialise a pending entry with its assigned identifier.
    pub fn from_new(id: Uuid, event: NewEvent) -> Self {
        Self {
            id,
            order_id: event.order_id,
            actor: event.actor,
            source_address: event.source_address,
            kind: event.kind,
            changes: event.changes,
            created_at: event.created_at,
        }
    }

    pub fn has_change(&self, change: &str) -> bool {
        self.changes.contains(change)
    }
}
