//! Checkout
//!
//! Turns a priced cart into a payment and one order per line, for cash on
//! delivery, wallet and gateway payments alike.

pub mod errors;
pub mod plan;
pub mod service;

pub use errors::CheckoutError;
pub use plan::{CheckoutPlan, PlannedLine, apportion_coupon};
pub use service::*;
