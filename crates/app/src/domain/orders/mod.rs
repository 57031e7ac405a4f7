//! Orders
//!
//! One order per purchased line, grouped under a payment. Cancellation and
//! return undo what checkout did: stock goes back, the payment total shrinks
//! and, depending on how it was paid, the customer's wallet is refunded.

pub mod data;
pub mod errors;
pub mod records;
mod repository;
pub mod service;
pub mod status;

pub use errors::OrdersServiceError;
pub(crate) use repository::PgOrdersRepository;
pub use service::*;
pub use status::{Actor, Refund, Transition, TransitionError, plan_transition};
