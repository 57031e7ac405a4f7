//! Begin Gateway Checkout Handler

use std::sync::Arc;

use jiff::Timestamp;
use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use emporium_app::domain::payments::records::PaymentMethod;

use crate::{
    checkout::{errors::into_failure, models::CheckoutResponse},
    extensions::*,
    observability::record_checkout,
    state::State,
};

/// Begin Gateway Checkout Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct BeginGatewayCheckoutRequest {
    pub address_uuid: Uuid,
}

/// Begin Gateway Checkout Handler
///
/// Validates the cart and opens a gateway order for the amount due. Orders
/// are only placed once the payment is verified.
#[endpoint(
    tags("checkout"),
    summary = "Begin Gateway Checkout",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Gateway order created"),
        (status_code = StatusCode::NOT_FOUND, description = "Address not found"),
        (status_code = StatusCode::CONFLICT, description = "Cart cannot be checked out"),
        (status_code = StatusCode::BAD_GATEWAY, description = "Payment gateway unavailable"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "checkout.gateway.begin",
    skip(json, depot, res),
    fields(user_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<BeginGatewayCheckoutRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<CheckoutResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_or_401()?;
    let address = json.into_inner().address_uuid;

    tracing::Span::current().record("user_uuid", tracing::field::display(user));

    let result = state
        .app
        .checkout
        .begin_gateway_checkout(user, address.into(), Timestamp::now())
        .await;

    match result {
        Ok(handoff) => {
            record_checkout(PaymentMethod::Gateway.as_str(), "started");

            Ok(Json(CheckoutResponse::handoff(handoff)))
        }
        Err(error) => {
            let failure = into_failure(error);

            record_checkout(PaymentMethod::Gateway.as_str(), failure.outcome());

            failure.respond(res)
        }
    }
}
