//! Payments
//!
//! Payment records, the external card/UPI gateway client and the checks a
//! gateway confirmation must pass before it is trusted.

pub mod data;
pub mod gateway;
pub mod pending;
pub mod records;
mod repository;
pub mod signature;
pub mod verification;

pub use gateway::{
    GatewayConfig, GatewayError, GatewayOrder, GatewayPayment, MockPaymentGateway,
    PaymentGateway, RazorpayGateway,
};
pub(crate) use pending::PgPendingRepository;
pub(crate) use repository::PgPaymentsRepository;
pub use verification::{CaptureError, verify_capture};
