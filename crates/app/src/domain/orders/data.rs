//! Order Data

use jiff::Timestamp;

use crate::domain::{
    addresses::records::AddressSnapshot,
    orders::records::OrderUuid,
    payments::records::PaymentUuid,
    products::records::{ProductUuid, Size},
    users::records::UserUuid,
};

/// New Order Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub uuid: OrderUuid,
    pub payment_uuid: PaymentUuid,
    pub user_uuid: UserUuid,
    pub product_uuid: ProductUuid,
    pub size: Size,
    pub quantity: u32,
    pub unit_price: u64,
    pub line_amount: u64,
    pub final_amount: u64,
    pub address: AddressSnapshot,
    pub user_name: String,
    pub product_name: String,
    pub brand: String,
    pub placed_at: Timestamp,
}
