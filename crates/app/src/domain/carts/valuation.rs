//! Cart valuation
//!
//! Prices are never trusted from storage: every read re-prices each line
//! from the current product price and the offers live at the given instant.

use jiff::Timestamp;
use rustc_hash::FxHashMap;

use crate::domain::{
    carts::records::{CartItemUuid, CartRecord},
    categories::records::CategoryUuid,
    coupons::records::AppliedCoupon,
    offers::{records::OfferRecord, resolve_discount},
    pricing::{Percentage, final_price, line_total},
    products::records::{ProductRecord, ProductUuid, Size, StockLevel},
    users::records::UserUuid,
};

/// Current catalogue data for a cart line's product.
#[derive(Debug, Clone, PartialEq)]
pub struct LineProduct {
    pub name: String,
    pub brand: String,
    pub category_uuid: CategoryUuid,
    pub initial_price: u64,
    pub discount: Percentage,
    pub final_price: u64,
    pub stock: Option<StockLevel>,
}

/// A priced cart line.
///
/// `product` is `None` when the product has been deleted since it was added;
/// such lines contribute nothing to the totals.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuatedLine {
    pub item_uuid: CartItemUuid,
    pub product_uuid: ProductUuid,
    pub size: Size,
    pub quantity: u32,
    pub product: Option<LineProduct>,
    pub total_amount: u64,
    pub total_initial_amount: u64,
}

/// A fully priced cart.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuatedCart {
    pub user_uuid: UserUuid,
    pub lines: Vec<ValuatedLine>,
    pub coupon: Option<AppliedCoupon>,
    pub total_amount: u64,
    pub total_initial_amount: u64,
}

impl ValuatedCart {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn coupon_amount(&self) -> u64 {
        self.coupon.as_ref().map_or(0, |coupon| coupon.amount)
    }

    /// Amount due once the applied coupon is deducted.
    #[must_use]
    pub fn payable_amount(&self) -> u64 {
        self.total_amount.saturating_sub(self.coupon_amount())
    }
}

/// Price `cart` against `products` and the candidate `offers` at `at`.
#[must_use]
pub fn valuate(
    cart: &CartRecord,
    products: &FxHashMap<ProductUuid, ProductRecord>,
    offers: &[OfferRecord],
    at: Timestamp,
) -> ValuatedCart {
    let lines: Vec<ValuatedLine> = cart
        .items
        .iter()
        .map(|item| {
            let product = products.get(&item.product_uuid).map(|product| {
                let discount = resolve_discount(offers, product.uuid, product.category_uuid, at);

                LineProduct {
                    name: product.name.clone(),
                    brand: product.brand.clone(),
                    category_uuid: product.category_uuid,
                    initial_price: product.price,
                    discount,
                    final_price: final_price(product.price, discount),
                    stock: product.stock_for(item.size),
                }
            });

            let (total_amount, total_initial_amount) =
                product.as_ref().map_or((0, 0), |product| {
                    (
                        line_total(product.final_price, item.quantity),
                        line_total(product.initial_price, item.quantity),
                    )
                });

            ValuatedLine {
                item_uuid: item.uuid,
                product_uuid: item.product_uuid,
                size: item.size,
                quantity: item.quantity,
                product,
                total_amount,
                total_initial_amount,
            }
        })
        .collect();

    let total_amount = lines.iter().map(|line| line.total_amount).sum();
    let total_initial_amount = lines.iter().map(|line| line.total_initial_amount).sum();

    ValuatedCart {
        user_uuid: cart.user_uuid,
        lines,
        coupon: cart.coupon.clone(),
        total_amount,
        total_initial_amount,
    }
}
