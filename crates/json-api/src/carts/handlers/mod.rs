//! Cart Handlers

pub(crate) mod add_item;
pub(crate) mod apply_coupon;
pub(crate) mod get;
pub(crate) mod remove_coupon;
pub(crate) mod remove_item;
pub(crate) mod update_item;
pub(crate) mod validation;

#[cfg(test)]
pub(crate) mod tests {
    use emporium_app::domain::{
        carts::{LineProduct, ValuatedCart, ValuatedLine, records::CartItemUuid},
        categories::records::CategoryUuid,
        pricing::Percentage,
        products::records::{ProductUuid, Size, StockLevel},
    };

    use crate::test_helpers::TEST_USER;

    pub(crate) fn make_cart(lines: Vec<ValuatedLine>) -> ValuatedCart {
        let total_amount = lines.iter().map(|line| line.total_amount).sum();
        let total_initial_amount = lines.iter().map(|line| line.total_initial_amount).sum();

        ValuatedCart {
            user_uuid: TEST_USER,
            lines,
            coupon: None,
            total_amount,
            total_initial_amount,
        }
    }

    pub(crate) fn make_line(item: CartItemUuid, quantity: u32) -> ValuatedLine {
        let discount = Percentage::new(20).unwrap_or_default();

        ValuatedLine {
            item_uuid: item,
            product_uuid: ProductUuid::new(),
            size: Size::Medium,
            quantity,
            product: Some(LineProduct {
                name: "Linen Shirt".to_string(),
                brand: "Loom".to_string(),
                category_uuid: CategoryUuid::new(),
                initial_price: 1000,
                discount,
                final_price: 800,
                stock: Some(StockLevel {
                    available: 5,
                    sold: 0,
                }),
            }),
            total_amount: 800 * u64::from(quantity),
            total_initial_amount: 1000 * u64::from(quantity),
        }
    }
}
