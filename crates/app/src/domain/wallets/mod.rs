//! Wallets

pub mod data;
pub mod errors;
pub mod records;
mod repository;
pub mod service;

pub use errors::WalletsServiceError;
pub(crate) use repository::PgWalletsRepository;
pub use service::*;
