//! Verify Wallet Top-Up Handler

use std::sync::Arc;

use jiff::Timestamp;
use salvo::{oapi::extract::JsonBody, prelude::*};

use crate::{
    checkout::models::GatewayConfirmationRequest,
    extensions::*,
    state::State,
    wallet::{errors::into_status_error, get::WalletTransactionResponse},
};

/// Verify Wallet Top-Up Handler
///
/// Credits the wallet once the gateway payment is verified.
#[endpoint(
    tags("wallet"),
    summary = "Verify Wallet Top-Up",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Wallet credited"),
        (status_code = StatusCode::NOT_FOUND, description = "Pending top-up not found"),
        (status_code = StatusCode::CONFLICT, description = "Already processed or expired"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Payment could not be verified"),
        (status_code = StatusCode::BAD_GATEWAY, description = "Payment gateway unavailable"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "wallet.top_up.verify",
    skip(json, depot, res),
    fields(user_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<GatewayConfirmationRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<WalletTransactionResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_or_401()?;
    let request = json.into_inner();

    if request.has_blank_field() {
        return Err(StatusError::bad_request().brief("Gateway confirmation is incomplete"));
    }

    tracing::Span::current().record("user_uuid", tracing::field::display(user));

    let transaction = state
        .app
        .wallets
        .confirm_top_up(user, request.into(), Timestamp::now())
        .await
        .map_err(into_status_error)?;

    tracing::info!(amount = transaction.amount, "credited wallet top-up");

    res.status_code(StatusCode::CREATED);

    Ok(Json(transaction.into()))
}
