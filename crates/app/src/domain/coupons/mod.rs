//! Coupons

pub mod data;
pub mod errors;
pub mod records;
mod repository;
pub mod service;
pub mod validator;

pub use errors::CouponsServiceError;
pub(crate) use repository::PgCouponsRepository;
pub use service::*;
pub use validator::{CouponRejection, CouponRules, validate_coupon};
