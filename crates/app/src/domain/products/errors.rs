//! Catalog product errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProductsServiceError {
    /// A product with this uuid is already stored.
    #[error("product already exists")]
    AlreadyExists,

    /// Unknown or soft-deleted product.
    #[error("product not found")]
    NotFound,

    /// The category the product points at does not exist.
    #[error("product category not found")]
    InvalidReference,

    #[error("product is missing a required field")]
    MissingRequiredData,

    /// A price, size or stock count failed a table constraint, for example
    /// stock that would drop below zero.
    #[error("product data violates a catalog constraint")]
    InvalidData,

    #[error("product storage error")]
    Sql(#[source] Error),
}

impl From<Error> for ProductsServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::NotNullViolation) => Self::MissingRequiredData,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            Some(ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}
