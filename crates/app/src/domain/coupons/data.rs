//! Coupon Data

use jiff::Timestamp;

use crate::domain::coupons::records::CouponUuid;

/// New Coupon Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewCoupon {
    pub uuid: CouponUuid,
    pub code: String,
    pub minimum_purchase: u64,
    pub discount_amount: u64,
    pub valid_from: Timestamp,
    pub valid_upto: Option<Timestamp>,
}
