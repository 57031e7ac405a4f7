//! Order Records

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    domain::{
        addresses::records::AddressSnapshot,
        payments::records::{PaymentMethod, PaymentUuid},
        products::records::{ProductUuid, Size},
        users::records::UserUuid,
    },
    uuids::TypedUuid,
};

/// Order UUID
pub type OrderUuid = TypedUuid<OrderRecord>;

/// Where an order is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Placed,
    Cancelled,
    Delivered,
    Returned,
    ReturnReceived,
}

impl OrderStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Placed => "placed",
            Self::Cancelled => "cancelled",
            Self::Delivered => "delivered",
            Self::Returned => "returned",
            Self::ReturnReceived => "return_received",
        }
    }

    /// Customer-facing name of the status.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Placed => "Placed",
            Self::Cancelled => "Cancelled",
            Self::Delivered => "Delivered",
            Self::Returned => "Returned",
            Self::ReturnReceived => "Return Received",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownOrderStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "placed" => Ok(Self::Placed),
            "cancelled" => Ok(Self::Cancelled),
            "delivered" => Ok(Self::Delivered),
            "returned" => Ok(Self::Returned),
            "return_received" => Ok(Self::ReturnReceived),
            other => Err(UnknownOrderStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown order status `{0}`")]
pub struct UnknownOrderStatus(pub String);

/// Order Record
///
/// One purchased cart line. Product and address details are copied at
/// placement so later catalog edits do not rewrite order history.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub uuid: OrderUuid,
    pub payment_uuid: PaymentUuid,
    pub payment_method: PaymentMethod,
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
    pub status: OrderStatus,
    pub placed_at: Timestamp,
    pub delivered_at: Option<Timestamp>,
    pub cancelled_at: Option<Timestamp>,
    pub returned_at: Option<Timestamp>,
    pub updated_at: Timestamp,
}
