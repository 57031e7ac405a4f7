//! Order status transitions
//!
//! | from      | to              | who      | reverses | refund to wallet     |
//! |-----------|-----------------|----------|----------|----------------------|
//! | Placed    | Cancelled       | anyone   | yes      | unless cash on delivery |
//! | Placed    | Delivered       | admin    | no       | no                   |
//! | Delivered | Returned        | anyone   | yes      | always               |
//! | Returned  | Return Received | admin    | no       | no                   |
//!
//! Returns are accepted up to [`RETURN_WINDOW`] after delivery.

use jiff::{SignedDuration, Timestamp};
use thiserror::Error;

use crate::domain::{orders::records::OrderStatus, payments::records::PaymentMethod};

/// How long after delivery an order may be returned.
pub const RETURN_WINDOW: SignedDuration = SignedDuration::from_hours(24 * 10);

/// Who is asking for the transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Customer,
    Admin,
}

/// When a reversed order's amount goes back to the customer's wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refund {
    Never,
    UnlessCashOnDelivery,
    Always,
}

impl Refund {
    /// Whether an order paid with `method` is refunded.
    #[must_use]
    pub const fn applies_to(self, method: PaymentMethod) -> bool {
        match self {
            Self::Never => false,
            Self::UnlessCashOnDelivery => !matches!(method, PaymentMethod::CashOnDelivery),
            Self::Always => true,
        }
    }
}

/// Side effects of an allowed transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: OrderStatus,
    pub to: OrderStatus,

    /// Give stock back and take the amount off the payment.
    pub reverses: bool,

    pub refund: Refund,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("cannot move an order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("only an admin can move an order from {from} to {to}")]
    AdminOnly { from: OrderStatus, to: OrderStatus },

    #[error("the return window has closed")]
    ReturnWindowClosed,
}

/// Decide whether an order in `from` may move to `to`.
///
/// `delivered_at` is consulted only for returns.
///
/// # Errors
///
/// Returns a [`TransitionError`] for transitions outside the table, admin
/// transitions requested by a customer and returns outside the window.
pub fn plan_transition(
    from: OrderStatus,
    to: OrderStatus,
    actor: Actor,
    delivered_at: Option<Timestamp>,
    at: Timestamp,
) -> Result<Transition, TransitionError> {
    let (admin_only, reverses, refund) = match (from, to) {
        (OrderStatus::Placed, OrderStatus::Cancelled) => {
            (false, true, Refund::UnlessCashOnDelivery)
        }
        (OrderStatus::Placed, OrderStatus::Delivered)
        | (OrderStatus::Returned, OrderStatus::ReturnReceived) => (true, false, Refund::Never),
        (OrderStatus::Delivered, OrderStatus::Returned) => (false, true, Refund::Always),
        _ => return Err(TransitionError::InvalidTransition { from, to }),
    };

    if admin_only && actor != Actor::Admin {
        return Err(TransitionError::AdminOnly { from, to });
    }

    if to == OrderStatus::Returned && !within_return_window(delivered_at, at) {
        return Err(TransitionError::ReturnWindowClosed);
    }

    Ok(Transition {
        from,
        to,
        reverses,
        refund,
    })
}

fn within_return_window(delivered_at: Option<Timestamp>, at: Timestamp) -> bool {
    delivered_at.is_some_and(|delivered_at| at.duration_since(delivered_at) <= RETURN_WINDOW)
}
