//! Carts

pub mod data;
pub mod errors;
pub(crate) mod pipeline;
pub mod records;
mod repositories;
pub mod service;
pub mod stock;
pub mod valuation;

pub use errors::CartsServiceError;
pub use service::*;
pub use stock::{InvalidLine, StockIssue, check_line, validate_stock};
pub use valuation::{LineProduct, ValuatedCart, ValuatedLine, valuate};
