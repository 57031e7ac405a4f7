//! Checkout errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::domain::{
    carts::stock::InvalidLine,
    checkout::plan::MissingProduct,
    coupons::CouponRejection,
    payments::{CaptureError, GatewayError},
};

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("address not found")]
    AddressNotFound,

    #[error("cart is empty")]
    EmptyCart,

    /// The applied coupon no longer qualifies and has been removed from the
    /// cart.
    #[error("coupon rejected: {0}")]
    CouponRejected(CouponRejection),

    #[error("{} cart line(s) cannot be fulfilled", .0.len())]
    StockUnavailable(Vec<InvalidLine>),

    /// Stock ran out between validation and the conditional decrement.
    #[error("stock changed while checking out")]
    StockChanged,

    #[error("insufficient wallet balance")]
    InsufficientBalance,

    #[error("gateway payments go through the gateway checkout")]
    UnsupportedMethod,

    #[error("nothing to pay through the gateway")]
    NothingToPay,

    #[error("pending checkout not found")]
    NotFound,

    #[error("pending checkout has expired")]
    Expired,

    #[error("payment already processed")]
    AlreadyProcessed,

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("related resource not found")]
    InvalidReference,

    #[error("invalid data")]
    InvalidData,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<MissingProduct> for CheckoutError {
    fn from(_: MissingProduct) -> Self {
        Self::StockChanged
    }
}

impl From<Error> for CheckoutError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            // Gateway ids on payments and wallet transactions are unique, so
            // a concurrent second confirmation lands here.
            Some(ErrorKind::UniqueViolation) => Self::AlreadyProcessed,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            Some(ErrorKind::NotNullViolation | ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}
