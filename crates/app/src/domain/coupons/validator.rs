//! Coupon validation

use jiff::Timestamp;
use serde::Serialize;
use thiserror::Error;

use crate::domain::coupons::records::CouponRecord;

/// Store-wide coupon policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouponRules {
    /// Code that may only be redeemed by users without any prior orders.
    pub first_purchase_code: String,
}

impl Default for CouponRules {
    fn default() -> Self {
        Self {
            first_purchase_code: "WELCOME".to_string(),
        }
    }
}

/// Why a coupon cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "camelCase", tag = "reason")]
pub enum CouponRejection {
    #[error("coupon is only valid on a first purchase")]
    FirstPurchaseOnly,

    #[error("cart total is below the coupon minimum of {minimum}")]
    BelowMinimumPurchase { minimum: u64 },

    #[error("coupon is not valid yet")]
    NotYetValid,

    #[error("coupon has expired")]
    Expired,

    #[error("coupon is not active")]
    Inactive,
}

/// Check `coupon` against a cart worth `cart_total` for a user with
/// `prior_orders` orders. Rules are evaluated in a fixed order and the first
/// failure is returned.
///
/// # Errors
///
/// Returns the first [`CouponRejection`] that applies.
pub fn validate_coupon(
    coupon: &CouponRecord,
    rules: &CouponRules,
    prior_orders: u64,
    cart_total: u64,
    at: Timestamp,
) -> Result<(), CouponRejection> {
    if coupon.code == rules.first_purchase_code && prior_orders > 0 {
        return Err(CouponRejection::FirstPurchaseOnly);
    }

    if cart_total < coupon.minimum_purchase {
        return Err(CouponRejection::BelowMinimumPurchase {
            minimum: coupon.minimum_purchase,
        });
    }

    if at < coupon.valid_from {
        return Err(CouponRejection::NotYetValid);
    }

    if coupon.valid_upto.is_some_and(|upto| at > upto) {
        return Err(CouponRejection::Expired);
    }

    if !coupon.is_active {
        return Err(CouponRejection::Inactive);
    }

    Ok(())
}
