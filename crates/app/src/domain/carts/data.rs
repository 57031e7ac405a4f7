//! Cart Data

use crate::domain::{
    carts::records::CartItemUuid,
    products::records::{ProductUuid, Size},
};

/// New Cart Item Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewCartItem {
    pub uuid: CartItemUuid,
    pub product_uuid: ProductUuid,
    pub size: Size,
    pub quantity: u32,
}
