//! Cart Records

use jiff::Timestamp;

use crate::{
    domain::{
        coupons::records::AppliedCoupon,
        products::records::{ProductUuid, Size},
        users::records::UserUuid,
    },
    uuids::TypedUuid,
};

/// Cart Record
///
/// Each user owns at most one cart. The totals are a display cache and are
/// recomputed by valuation on every read.
#[derive(Debug, Clone, PartialEq)]
pub struct CartRecord {
    pub user_uuid: UserUuid,
    pub items: Vec<CartItemRecord>,
    pub coupon: Option<AppliedCoupon>,
    pub total_amount: u64,
    pub total_initial_amount: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CartRecord {
    /// An unsaved empty cart for a user who has never added anything.
    #[must_use]
    pub fn empty(user_uuid: UserUuid, at: Timestamp) -> Self {
        Self {
            user_uuid,
            items: Vec::new(),
            coupon: None,
            total_amount: 0,
            total_initial_amount: 0,
            created_at: at,
            updated_at: at,
        }
    }
}

/// Cart Item UUID
pub type CartItemUuid = TypedUuid<CartItemRecord>;

/// Cart Item Record
#[derive(Debug, Clone, PartialEq)]
pub struct CartItemRecord {
    pub uuid: CartItemUuid,
    pub product_uuid: ProductUuid,
    pub size: Size,
    pub quantity: u32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
