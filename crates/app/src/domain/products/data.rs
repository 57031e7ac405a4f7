//! Products Data

use crate::domain::{
    categories::records::CategoryUuid,
    products::records::{ProductUuid, Size},
};

/// New Product Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub uuid: ProductUuid,
    pub category_uuid: CategoryUuid,
    pub name: String,
    pub brand: String,
    pub price: u64,
    pub stock: Vec<(Size, u32)>,
}

/// Stock Update Data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockUpdate {
    pub size: Size,
    pub available: u32,
}
