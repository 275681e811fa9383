//! Entitlement checks: may this caller act on this order's downloads?
//!
//! The predicates are pure. [`authorise_order`] turns a failed predicate into
//! an `Unauthorized` error whose message distinguishes "not yours" from
//! "not paid"; the error kind stays the same.

use super::{CallerContext, Error, Order};

/// True when the caller owns the order or holds administrative capability.
///
/// An anonymous caller never owns an order.
///
/// # Examples
/// ```
/// use backend::domain::{
///     CallerContext, Order, OrderId, PaymentState, UserId, check_ownership,
/// };
///
/// let owner = UserId::random();
/// let order = Order::new(OrderId::random(), owner.clone(), PaymentState::Paid);
/// assert!(check_ownership(&CallerContext::user(owner), &order));
/// assert!(!check_ownership(&CallerContext::anonymous(), &order));
/// assert!(check_ownership(&CallerContext::admin(UserId::random()), &order));
/// ```
pub fn check_ownership(caller: &CallerContext, order: &Order) -> bool {
    caller.is_admin() || caller.user_id() == Some(order.user_id())
}

/// True when the order's payment has been captured.
pub fn check_paid(order: &Order) -> bool {
    order.is_paid()
}

/// What the caller is trying to reach; selects the denial wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntitlementSubject {
    /// A single download.
    Download,
    /// An order's download set.
    Order,
}

impl EntitlementSubject {
    fn not_owner_message(self) -> &'static str {
        match self {
            Self::Download => "Not Authorized to access this download",
            Self::Order => "You don't have permission to access this order",
        }
    }

    fn unpaid_message(self) -> &'static str {
        match self {
            Self::Download => "This download has not been paid yet",
            Self::Order => "This order has not been completed yet",
        }
    }
}

/// Apply ownership then payment checks.
///
/// Ownership is checked first so a stranger learns nothing about payment
/// state.
pub fn authorise_order(
    caller: &CallerContext,
    order: &Order,
    subject: EntitlementSubject,
) -> Result<(), Error> {
    if !check_ownership(caller, order) {
        tracing::info!(order_id = %order.id(), "entitlement denied: caller does not own order");
        return Err(Error::unauthorized(subject.not_owner_message()));
    }
    if !check_paid(order) {
        tracing::info!(
            order_id = %order.id(),
            payment_state = %order.payment_state(),
            "entitlement denied: order not paid"
        );
        return Err(Error::unauthorized(subject.unpaid_message()));
    }
    Ok(())
}
