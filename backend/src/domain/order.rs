//! Orders, their payment state and purchased line items.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserId;

/// Identifier of a purchase order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payment lifecycle state of an order.
///
/// Only [`PaymentState::Paid`] unlocks downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    /// Awaiting payment.
    Pending,
    /// Payment captured.
    Paid,
    /// Payment declined or abandoned.
    Failed,
    /// Payment returned to the purchaser.
    Refunded,
}

impl PaymentState {
    /// Stable storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }

    /// Whether this state grants access to the order's downloads.
    pub const fn is_paid(self) -> bool {
        matches!(self, Self::Paid)
    }
}

impl fmt::Display for PaymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown payment state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown payment state: {0}")]
pub struct ParsePaymentStateError(pub String);

impl FromStr for PaymentState {
    type Err = ParsePaymentStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            other => Err(ParsePaymentStateError(other.to_owned())),
        }
    }
}

/// A purchase order owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    id: OrderId,
    user_id: UserId,
    payment_state: PaymentState,
}

impl Order {
    /// Assemble an order.
    pub fn new(id: OrderId, user_id: UserId, payment_state: PaymentState) -> Self {
        Self {
            id,
            user_id,
            payment_state,
        }
    }

    /// Order identifier.
    pub fn id(&self) -> OrderId {
        self.id
    }

    /// Owner of the order.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Current payment state.
    pub fn payment_state(&self) -> PaymentState {
        self.payment_state
    }

    /// Whether payment has been captured.
    pub fn is_paid(&self) -> bool {
        self.payment_state.is_paid()
    }
}

/// A purchased product line on an order.
///
/// `path` locates the product in the external catalogue and is used when
/// reconciling downloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLineItem {
    pub id: Uuid,
    pub order_id: OrderId,
    pub sku: String,
    pub title: String,
    pub path: String,
}
