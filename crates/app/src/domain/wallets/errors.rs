//! Wallets service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::domain::payments::{CaptureError, GatewayError};

#[derive(Debug, Error)]
pub enum WalletsServiceError {
    #[error("wallet not found")]
    NotFound,

    #[error("top-up amount must be positive")]
    InvalidAmount,

    #[error("pending top-up has expired")]
    Expired,

    /// The gateway payment was already credited or used for an order.
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

impl From<Error> for WalletsServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            // Gateway payment ids are the only unique values written here.
            Some(ErrorKind::UniqueViolation) => Self::AlreadyProcessed,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            Some(ErrorKind::NotNullViolation | ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}
