//! Begin Wallet Top-Up Handler

use std::sync::Arc;

use jiff::Timestamp;
use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::{
    checkout::models::GatewayHandoffResponse, extensions::*, state::State,
    wallet::errors::into_status_error,
};

/// Top-Up Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct TopUpRequest {
    /// Amount in minor units
    pub amount: u64,
}

/// Begin Wallet Top-Up Handler
#[endpoint(
    tags("wallet"),
    summary = "Begin Wallet Top-Up",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Gateway order created"),
        (status_code = StatusCode::BAD_GATEWAY, description = "Payment gateway unavailable"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "wallet.top_up.begin",
    skip(json, depot),
    fields(user_uuid = tracing::field::Empty, amount = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<TopUpRequest>,
    depot: &mut Depot,
) -> Result<Json<GatewayHandoffResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_or_401()?;
    let amount = json.into_inner().amount;

    let span = tracing::Span::current();

    span.record("user_uuid", tracing::field::display(user));
    span.record("amount", amount);

    let handoff = state
        .app
        .wallets
        .begin_top_up(user, amount, Timestamp::now())
        .await
        .map_err(into_status_error)?;

    Ok(Json(handoff.into()))
}
