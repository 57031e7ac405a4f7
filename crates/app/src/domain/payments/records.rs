//! Payment Records

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    domain::{coupons::records::AppliedCoupon, users::records::UserUuid},
    uuids::TypedUuid,
};

/// Payment UUID
pub type PaymentUuid = TypedUuid<PaymentRecord>;

/// How an order group was paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CashOnDelivery,
    Wallet,
    Gateway,
}

impl PaymentMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CashOnDelivery => "cash_on_delivery",
            Self::Wallet => "wallet",
            Self::Gateway => "gateway",
        }
    }

    /// Customer-facing name of the method.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CashOnDelivery => "Cash on Delivery",
            Self::Wallet => "Wallet Payment",
            Self::Gateway => "Gateway Payment",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PaymentMethod {
    type Err = UnknownPaymentMethod;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "cash_on_delivery" => Ok(Self::CashOnDelivery),
            "wallet" => Ok(Self::Wallet),
            "gateway" => Ok(Self::Gateway),
            other => Err(UnknownPaymentMethod(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown payment method `{0}`")]
pub struct UnknownPaymentMethod(pub String);

/// Identifiers the gateway hands back once a customer has paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayReference {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

/// Payment Record
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRecord {
    pub uuid: PaymentUuid,
    pub user_uuid: UserUuid,
    pub method: PaymentMethod,
    pub total_amount: u64,
    pub coupon: Option<AppliedCoupon>,
    pub gateway: Option<GatewayReference>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// What the customer's browser needs to open the gateway's payment widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayHandoff {
    pub gateway_order_id: String,
    pub amount: u64,
    pub currency: String,
    pub key_id: String,
}
