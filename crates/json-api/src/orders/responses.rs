//! Order response bodies.

use std::string::ToString;

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use emporium_app::domain::{addresses::records::AddressSnapshot, orders::records::OrderRecord};

/// Delivery address captured when the order was placed
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ShippingAddressResponse {
    pub name: String,
    pub phone: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

impl From<AddressSnapshot> for ShippingAddressResponse {
    fn from(address: AddressSnapshot) -> Self {
        Self {
            name: address.name,
            phone: address.phone,
            line1: address.line1,
            line2: address.line2,
            city: address.city,
            state: address.state,
            postal_code: address.postal_code,
        }
    }
}

/// Order Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderResponse {
    pub uuid: Uuid,
    pub payment_uuid: Uuid,

    /// `cash_on_delivery`, `wallet` or `gateway`
    pub payment_method: String,

    pub product_uuid: Uuid,
    pub product_name: String,
    pub brand: String,
    pub size: String,
    pub quantity: u32,

    /// Discounted unit price at placement
    pub unit_price: u64,
    pub line_amount: u64,

    /// Line amount less this order's share of the coupon
    pub final_amount: u64,

    /// `placed`, `cancelled`, `delivered`, `returned` or `return_received`
    pub status: String,

    pub address: ShippingAddressResponse,
    pub placed_at: String,
    pub delivered_at: Option<String>,
    pub cancelled_at: Option<String>,
    pub returned_at: Option<String>,
}

impl From<OrderRecord> for OrderResponse {
    fn from(order: OrderRecord) -> Self {
        Self {
            uuid: order.uuid.into_uuid(),
            payment_uuid: order.payment_uuid.into_uuid(),
            payment_method: order.payment_method.as_str().to_string(),
            product_uuid: order.product_uuid.into_uuid(),
            product_name: order.product_name,
            brand: order.brand,
            size: order.size.to_string(),
            quantity: order.quantity,
            unit_price: order.unit_price,
            line_amount: order.line_amount,
            final_amount: order.final_amount,
            status: order.status.as_str().to_string(),
            address: order.address.into(),
            placed_at: order.placed_at.to_string(),
            delivered_at: order.delivered_at.as_ref().map(ToString::to_string),
            cancelled_at: order.cancelled_at.as_ref().map(ToString::to_string),
            returned_at: order.returned_at.as_ref().map(ToString::to_string),
        }
    }
}
