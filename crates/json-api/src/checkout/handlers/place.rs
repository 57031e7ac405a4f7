//! Place Order Handler

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

/// Place Order Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct PlaceOrderRequest {
    /// One of the caller's addresses; it becomes their primary address
    pub address_uuid: Uuid,

    /// `cash_on_delivery` or `wallet`
    pub payment_method: String,
}

/// Place Order Handler
///
/// Checks out the whole cart as one order per line.
#[endpoint(
    tags("checkout"),
    summary = "Place Order",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Orders placed"),
        (status_code = StatusCode::NOT_FOUND, description = "Address not found"),
        (status_code = StatusCode::CONFLICT, description = "Cart cannot be checked out"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Insufficient wallet balance"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "checkout.place",
    skip(json, depot, res),
    fields(user_uuid = tracing::field::Empty, payment_method = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<PlaceOrderRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<CheckoutResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_or_401()?;
    let request = json.into_inner();

    let method = request
        .payment_method
        .parse::<PaymentMethod>()
        .or_400("unknown payment method")?;

    let span = tracing::Span::current();

    span.record("user_uuid", tracing::field::display(user));
    span.record("payment_method", method.as_str());

    let result = state
        .app
        .checkout
        .place_order(user, request.address_uuid.into(), method, Timestamp::now())
        .await;

    match result {
        Ok(placed) => {
            record_checkout(method.as_str(), "placed");

            tracing::info!(
                payment_uuid = %placed.payment.uuid,
                orders = placed.orders.len(),
                amount = placed.amount,
                "placed orders"
            );

            res.status_code(StatusCode::CREATED);

            Ok(Json(placed.into()))
        }
        Err(error) => {
            let failure = into_failure(error);

            record_checkout(method.as_str(), failure.outcome());

            failure.respond(res)
        }
    }
}
