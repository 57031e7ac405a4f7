//! Orders service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::domain::orders::status::TransitionError;

#[derive(Debug, Error)]
pub enum OrdersServiceError {
    #[error("order not found")]
    NotFound,

    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// The payment or stock counters no longer cover the order being
    /// reversed.
    #[error("order cannot be reversed against current records")]
    ReversalConflict,

    #[error("related resource not found")]
    InvalidReference,

    #[error("invalid data")]
    InvalidData,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for OrdersServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            Some(
                ErrorKind::UniqueViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::Other
                | _,
            )
            | None => Self::Sql(error),
        }
    }
}
