//! Stock validation
//!
//! Each cart line is checked against the current per-size stock of its
//! product. The first matching rule wins:
//!
//! 1. the product is not offered in the line's size: [`StockIssue::InvalidSize`]
//! 2. nothing is available, or the product is gone: [`StockIssue::NotAvailable`]
//! 3. more than [`MAX_LINE_QUANTITY`] units: [`StockIssue::MoreThanTen`]
//! 4. more units than available: [`StockIssue::MoreThanAvailable`]

use std::fmt;

use serde::Serialize;

use crate::domain::{
    carts::{records::CartItemUuid, valuation::ValuatedCart},
    pricing::MAX_LINE_QUANTITY,
    products::records::{ProductUuid, Size, StockLevel},
};

/// Reason a cart line cannot be fulfilled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StockIssue {
    #[serde(rename = "Invalid size")]
    InvalidSize,

    #[serde(rename = "Not available")]
    NotAvailable,

    #[serde(rename = "More than 10")]
    MoreThanTen,

    #[serde(rename = "More than available stock")]
    MoreThanAvailable,
}

impl StockIssue {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidSize => "Invalid size",
            Self::NotAvailable => "Not available",
            Self::MoreThanTen => "More than 10",
            Self::MoreThanAvailable => "More than available stock",
        }
    }
}

impl fmt::Display for StockIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cart line that failed stock validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidLine {
    pub item_uuid: CartItemUuid,
    pub product_uuid: ProductUuid,
    pub size: Size,
    pub quantity: u32,
    pub issue: StockIssue,
}

/// Check `quantity` units against a size's stock counters.
///
/// `level` is `None` when the product has no entry for the size.
#[must_use]
pub fn check_line(level: Option<StockLevel>, quantity: u32) -> Option<StockIssue> {
    let Some(level) = level else {
        return Some(StockIssue::InvalidSize);
    };

    if level.available == 0 {
        Some(StockIssue::NotAvailable)
    } else if quantity > MAX_LINE_QUANTITY {
        Some(StockIssue::MoreThanTen)
    } else if quantity > level.available {
        Some(StockIssue::MoreThanAvailable)
    } else {
        None
    }
}

/// Every line of `cart` that cannot currently be fulfilled, in cart order.
#[must_use]
pub fn validate_stock(cart: &ValuatedCart) -> Vec<InvalidLine> {
    cart.lines
        .iter()
        .filter_map(|line| {
            let issue = match &line.product {
                Some(product) => check_line(product.stock, line.quantity),
                None => Some(StockIssue::NotAvailable),
            }?;

            Some(InvalidLine {
                item_uuid: line.item_uuid,
                product_uuid: line.product_uuid,
                size: line.size,
                quantity: line.quantity,
                issue,
            })
        })
        .collect()
}
