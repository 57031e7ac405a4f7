//! Offers

pub mod data;
pub mod errors;
pub mod records;
mod repository;
pub mod resolver;
pub mod service;

pub use errors::OffersServiceError;
pub(crate) use repository::PgOffersRepository;
pub use resolver::resolve_discount;
pub use service::*;
