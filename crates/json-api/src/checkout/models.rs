//! Checkout request and response bodies.

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use emporium_app::domain::{
    checkout::PlacedCheckout,
    payments::records::{GatewayHandoff, GatewayReference},
};

use crate::{carts::responses::InvalidLineResponse, orders::responses::OrderResponse};

/// Gateway payment confirmation, as posted back by the storefront after the
/// gateway's client-side flow completes.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct GatewayConfirmationRequest {
    pub gateway_order_id: String,
    pub gateway_payment_id: String,

    /// Hex HMAC-SHA256 of `order_id|payment_id`
    pub signature: String,
}

impl GatewayConfirmationRequest {
    pub(crate) fn has_blank_field(&self) -> bool {
        [
            &self.gateway_order_id,
            &self.gateway_payment_id,
            &self.signature,
        ]
        .iter()
        .any(|value| value.trim().is_empty())
    }
}

impl From<GatewayConfirmationRequest> for GatewayReference {
    fn from(request: GatewayConfirmationRequest) -> Self {
        GatewayReference {
            order_id: request.gateway_order_id,
            payment_id: request.gateway_payment_id,
            signature: request.signature,
        }
    }
}

/// Details the storefront needs to open the gateway's payment form
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct GatewayHandoffResponse {
    pub gateway_order_id: String,

    /// Amount in minor units
    pub amount: u64,
    pub currency: String,

    /// Public key id for the gateway's client-side flow
    pub key_id: String,
}

impl From<GatewayHandoff> for GatewayHandoffResponse {
    fn from(handoff: GatewayHandoff) -> Self {
        Self {
            gateway_order_id: handoff.gateway_order_id,
            amount: handoff.amount,
            currency: handoff.currency,
            key_id: handoff.key_id,
        }
    }
}

/// Checkout Response
///
/// Rejections use the same shape with `success` set to false.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub(crate) struct CheckoutResponse {
    pub success: bool,
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_uuid: Option<Uuid>,

    /// Amount charged in minor units
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<u64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub orders: Vec<OrderResponse>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<GatewayHandoffResponse>,

    /// Lines that blocked the checkout
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invalid_lines: Vec<InvalidLineResponse>,

    /// Why the applied coupon was removed, e.g. `firstPurchaseOnly`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon_rejection: Option<String>,
}

impl CheckoutResponse {
    pub(crate) fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            ..Self::default()
        }
    }

    pub(crate) fn handoff(handoff: GatewayHandoff) -> Self {
        Self {
            success: true,
            message: "Gateway order created".to_string(),
            amount: Some(handoff.amount),
            gateway: Some(handoff.into()),
            ..Self::default()
        }
    }
}

impl From<PlacedCheckout> for CheckoutResponse {
    fn from(placed: PlacedCheckout) -> Self {
        Self {
            success: true,
            message: "Order placed".to_string(),
            payment_uuid: Some(placed.payment.uuid.into_uuid()),
            amount: Some(placed.amount),
            orders: placed.orders.into_iter().map(OrderResponse::from).collect(),
            ..Self::default()
        }
    }
}
