//! Checkout plans
//!
//! A plan is the priced cart frozen at the moment a customer commits to
//! paying. Gateway checkouts persist it between order creation and payment
//! confirmation so the customer is charged for exactly what they saw.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{
    addresses::records::AddressSnapshot,
    carts::valuation::ValuatedCart,
    coupons::records::AppliedCoupon,
    products::records::{ProductUuid, Size},
};

/// One cart line as it will become an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedLine {
    pub product_uuid: ProductUuid,
    pub size: Size,
    pub quantity: u32,
    pub product_name: String,
    pub brand: String,

    /// Discounted price of one unit.
    pub unit_price: u64,

    /// `quantity × unit_price`.
    pub line_amount: u64,

    /// `line_amount` less this line's share of the coupon.
    pub final_amount: u64,
}

/// Everything needed to turn a cart into a payment and its orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutPlan {
    pub address: AddressSnapshot,
    pub coupon: Option<AppliedCoupon>,
    pub lines: Vec<PlannedLine>,

    /// Sum of line amounts before the coupon.
    pub total_amount: u64,

    /// What the customer pays.
    pub payable_amount: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cart line for product {0} has no current product")]
pub struct MissingProduct(pub ProductUuid);

impl CheckoutPlan {
    /// Freeze a valuated cart.
    ///
    /// # Errors
    ///
    /// Returns [`MissingProduct`] if any line's product is gone. Stock
    /// validation reports such lines first, so this only guards against
    /// skipping it.
    pub fn from_cart(cart: &ValuatedCart, address: AddressSnapshot) -> Result<Self, MissingProduct> {
        let line_totals: Vec<u64> = cart.lines.iter().map(|line| line.total_amount).collect();
        let shares = apportion_coupon(cart.coupon_amount(), &line_totals);

        let lines = cart
            .lines
            .iter()
            .zip(shares)
            .map(|(line, share)| {
                let product = line
                    .product
                    .as_ref()
                    .ok_or(MissingProduct(line.product_uuid))?;

                Ok(PlannedLine {
                    product_uuid: line.product_uuid,
                    size: line.size,
                    quantity: line.quantity,
                    product_name: product.name.clone(),
                    brand: product.brand.clone(),
                    unit_price: product.final_price,
                    line_amount: line.total_amount,
                    final_amount: line.total_amount - share,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            address,
            coupon: cart.coupon.clone(),
            lines,
            total_amount: cart.total_amount,
            payable_amount: cart.payable_amount(),
        })
    }
}

/// Split a coupon `amount` across lines worth `line_totals`.
///
/// Each line gets an equal share, and the remainder of the division goes one
/// unit at a time to the first lines. A share never exceeds its line's total;
/// any excess moves to the next lines that still have room. The shares sum to
/// `amount` whenever `amount` does not exceed the sum of `line_totals`.
#[must_use]
pub fn apportion_coupon(amount: u64, line_totals: &[u64]) -> Vec<u64> {
    let Ok(count) = u64::try_from(line_totals.len()) else {
        return vec![0; line_totals.len()];
    };

    if count == 0 {
        return Vec::new();
    }

    let base = amount / count;
    let remainder = amount % count;

    let mut excess = 0;
    let mut shares: Vec<u64> = line_totals
        .iter()
        .zip(0..)
        .map(|(&total, index)| {
            let share = base + u64::from(index < remainder);

            if share > total {
                excess += share - total;
                total
            } else {
                share
            }
        })
        .collect();

    for (share, &total) in shares.iter_mut().zip(line_totals) {
        if excess == 0 {
            break;
        }

        let taken = (total - *share).min(excess);

        *share += taken;
        excess -= taken;
    }

    shares
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use rustc_hash::FxHashMap;

    use crate::domain::{
        carts::{
            records::{CartItemRecord, CartItemUuid, CartRecord},
            valuation::valuate,
        },
        categories::records::CategoryUuid,
        products::records::{ProductRecord, StockLevel},
        users::records::UserUuid,
    };

    use super::*;

    #[test]
    fn remainder_goes_to_the_first_lines() {
        let shares = apportion_coupon(100, &[500, 500, 500]);

        assert_eq!(shares, vec![34, 33, 33]);
    }

    #[test]
    fn even_split_has_no_remainder() {
        assert_eq!(apportion_coupon(90, &[100, 200, 300]), vec![30, 30, 30]);
    }

    #[test]
    fn share_never_exceeds_the_line_it_discounts() {
        let shares = apportion_coupon(500, &[10, 1_000]);

        assert_eq!(shares, vec![10, 490]);
        assert_eq!(shares.iter().sum::<u64>(), 500);
    }

    #[test]
    fn coupon_covering_the_whole_cart_zeroes_every_line() {
        let totals = [7, 3, 90];
        let shares = apportion_coupon(100, &totals);

        assert_eq!(shares, totals.to_vec());
    }

    #[test]
    fn no_coupon_means_no_shares() {
        assert_eq!(apportion_coupon(0, &[100, 200]), vec![0, 0]);
        assert!(apportion_coupon(50, &[]).is_empty());
    }

    fn address() -> AddressSnapshot {
        AddressSnapshot {
            name: "Asha".to_string(),
            phone: "5550100".to_string(),
            line1: "1 Market Street".to_string(),
            line2: None,
            city: "Pune".to_string(),
            state: "MH".to_string(),
            postal_code: "411001".to_string(),
        }
    }

    fn product(price: u64) -> ProductRecord {
        let mut stock = FxHashMap::default();

        stock.insert(
            Size::Medium,
            StockLevel {
                available: 10,
                sold: 0,
            },
        );

        ProductRecord {
            uuid: ProductUuid::new(),
            category_uuid: CategoryUuid::new(),
            name: format!("Shirt {price}"),
            brand: "Loom".to_string(),
            price,
            popularity: 0,
            stock,
            created_at: Timestamp::UNIX_EPOCH,
            updated_at: Timestamp::UNIX_EPOCH,
            deleted_at: None,
        }
    }

    fn cart_with(products: &[&ProductRecord], coupon: Option<AppliedCoupon>) -> CartRecord {
        let user = UserUuid::new();
        let mut cart = CartRecord::empty(user, Timestamp::UNIX_EPOCH);

        cart.coupon = coupon;
        cart.items = products
            .iter()
            .map(|product| CartItemRecord {
                uuid: CartItemUuid::new(),
                product_uuid: product.uuid,
                size: Size::Medium,
                quantity: 2,
                created_at: Timestamp::UNIX_EPOCH,
                updated_at: Timestamp::UNIX_EPOCH,
            })
            .collect();

        cart
    }

    #[test]
    fn plan_final_amounts_sum_to_the_payable_amount() -> Result<(), MissingProduct> {
        let shirt = product(1_000);
        let scarf = product(333);

        let products: FxHashMap<_, _> = [&shirt, &scarf]
            .into_iter()
            .map(|product| (product.uuid, product.clone()))
            .collect();

        let cart = cart_with(
            &[&shirt, &scarf],
            Some(AppliedCoupon {
                code: "SAVE".to_string(),
                amount: 101,
            }),
        );

        let valuated = valuate(&cart, &products, &[], Timestamp::UNIX_EPOCH);
        let plan = CheckoutPlan::from_cart(&valuated, address())?;

        assert_eq!(plan.total_amount, 2_666);
        assert_eq!(plan.payable_amount, 2_565);
        assert_eq!(
            plan.lines.iter().map(|line| line.final_amount).sum::<u64>(),
            plan.payable_amount
        );
        assert_eq!(plan.lines.first().map(|line| line.final_amount), Some(1_949));

        Ok(())
    }

    #[test]
    fn plan_refuses_lines_without_a_product() {
        let shirt = product(1_000);
        let cart = cart_with(&[&shirt], None);

        let valuated = valuate(&cart, &FxHashMap::default(), &[], Timestamp::UNIX_EPOCH);

        assert_eq!(
            CheckoutPlan::from_cart(&valuated, address()),
            Err(MissingProduct(shirt.uuid))
        );
    }
}
