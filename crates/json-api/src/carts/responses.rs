//! Cart response bodies shared by the cart and checkout handlers.

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use emporium_app::domain::{
    carts::{InvalidLine, ValuatedCart, ValuatedLine},
    coupons::records::AppliedCoupon,
};

use crate::carts::errors::issue_reason;

/// Cart Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CartResponse {
    /// Priced lines in insertion order
    pub lines: Vec<CartLineResponse>,

    /// Applied coupon, if any
    pub coupon: Option<CouponResponse>,

    /// Sum of discounted line totals in minor units
    pub total_amount: u64,

    /// Sum of undiscounted line totals in minor units
    pub total_initial_amount: u64,

    /// Amount due after the coupon
    pub payable_amount: u64,
}

impl From<ValuatedCart> for CartResponse {
    fn from(cart: ValuatedCart) -> Self {
        let coupon_amount = cart.coupon.as_ref().map_or(0, |coupon| coupon.amount);

        Self {
            lines: cart.lines.into_iter().map(CartLineResponse::from).collect(),
            coupon: cart.coupon.map(CouponResponse::from),
            total_amount: cart.total_amount,
            total_initial_amount: cart.total_initial_amount,
            payable_amount: cart.total_amount.saturating_sub(coupon_amount),
        }
    }
}

/// Cart Line Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CartLineResponse {
    pub item_uuid: Uuid,
    pub product_uuid: Uuid,
    pub size: String,
    pub quantity: u32,

    /// Product name, absent when the product no longer exists
    pub name: Option<String>,
    pub brand: Option<String>,
    pub initial_price: Option<u64>,

    /// Effective discount percentage
    pub discount: Option<u8>,
    pub final_price: Option<u64>,

    pub total_amount: u64,
    pub total_initial_amount: u64,
}

impl From<ValuatedLine> for CartLineResponse {
    fn from(line: ValuatedLine) -> Self {
        let product = line.product.as_ref();

        Self {
            item_uuid: line.item_uuid.into_uuid(),
            product_uuid: line.product_uuid.into_uuid(),
            size: line.size.to_string(),
            quantity: line.quantity,
            name: product.map(|product| product.name.clone()),
            brand: product.map(|product| product.brand.clone()),
            initial_price: product.map(|product| product.initial_price),
            discount: product.map(|product| product.discount.get()),
            final_price: product.map(|product| product.final_price),
            total_amount: line.total_amount,
            total_initial_amount: line.total_initial_amount,
        }
    }
}

/// Applied Coupon Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CouponResponse {
    pub code: String,
    pub amount: u64,
}

impl From<AppliedCoupon> for CouponResponse {
    fn from(coupon: AppliedCoupon) -> Self {
        Self {
            code: coupon.code,
            amount: coupon.amount,
        }
    }
}

/// A cart line that cannot be fulfilled
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct InvalidLineResponse {
    pub item_uuid: Uuid,
    pub product_uuid: Uuid,
    pub size: String,
    pub quantity: u32,

    /// One of `Invalid size`, `Not available`, `More than 10` or
    /// `More than available stock`
    pub reason: String,
}

impl From<InvalidLine> for InvalidLineResponse {
    fn from(line: InvalidLine) -> Self {
        Self {
            item_uuid: line.item_uuid.into_uuid(),
            product_uuid: line.product_uuid.into_uuid(),
            size: line.size.to_string(),
            quantity: line.quantity,
            reason: issue_reason(line.issue),
        }
    }
}
