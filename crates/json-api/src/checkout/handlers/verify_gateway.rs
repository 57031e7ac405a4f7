//! Verify Gateway Checkout Handler

use std::sync::Arc;

use jiff::Timestamp;
use salvo::{oapi::extract::JsonBody, prelude::*};

use emporium_app::domain::payments::records::PaymentMethod;

use crate::{
    checkout::{
        errors::into_failure,
        models::{CheckoutResponse, GatewayConfirmationRequest},
    },
    extensions::*,
    observability::record_checkout,
    state::State,
};

/// Verify Gateway Checkout Handler
///
/// Verifies the gateway signature and capture, then places the orders that
/// were priced when the checkout began.
#[endpoint(
    tags("checkout"),
    summary = "Verify Gateway Checkout",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Payment verified and orders placed"),
        (status_code = StatusCode::NOT_FOUND, description = "Pending checkout not found"),
        (status_code = StatusCode::CONFLICT, description = "Already processed, expired or out of stock"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Payment could not be verified"),
        (status_code = StatusCode::BAD_GATEWAY, description = "Payment gateway unavailable"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "checkout.gateway.verify",
    skip(json, depot, res),
    fields(user_uuid = tracing::field::Empty, gateway_order_id = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<GatewayConfirmationRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<CheckoutResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_or_401()?;
    let request = json.into_inner();

    if request.has_blank_field() {
        return Err(StatusError::bad_request().brief("Gateway confirmation is incomplete"));
    }

    let span = tracing::Span::current();

    span.record("user_uuid", tracing::field::display(user));
    span.record("gateway_order_id", request.gateway_order_id.as_str());

    let result = state
        .app
        .checkout
        .confirm_gateway_checkout(user, request.into(), Timestamp::now())
        .await;

    match result {
        Ok(placed) => {
            record_checkout(PaymentMethod::Gateway.as_str(), "placed");

            tracing::info!(
                payment_uuid = %placed.payment.uuid,
                orders = placed.orders.len(),
                amount = placed.amount,
                "placed gateway orders"
            );

            res.status_code(StatusCode::CREATED);

            Ok(Json(placed.into()))
        }
        Err(error) => {
            let failure = into_failure(error);

            record_checkout(PaymentMethod::Gateway.as_str(), failure.outcome());

            failure.respond(res)
        }
    }
}

#[cfg(test)]
mod tests {
    use emporium_app::domain::{checkout::CheckoutError, payments::CaptureError};
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use crate::{
        checkout::handlers::tests::make_placed,
        test_helpers::{Mocks, customer_service},
    };

    use super::*;

    fn make_service(mocks: Mocks) -> Service {
        customer_service(
            mocks,
            Router::with_path("checkout/gateway/verify").post(handler),
        )
    }

    fn confirmation() -> serde_json::Value {
        json!({
            "gateway_order_id": "order_001",
            "gateway_payment_id": "pay_001",
            "signature": "abcdef",
        })
    }

    #[tokio::test]
    async fn test_verified_payment_places_orders() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .checkout
            .expect_confirm_gateway_checkout()
            .once()
            .withf(|_, reference, _| {
                reference.order_id == "order_001"
                    && reference.payment_id == "pay_001"
                    && reference.signature == "abcdef"
            })
            .return_once(|_, _, _| Ok(make_placed(PaymentMethod::Gateway)));

        let mut res = TestClient::post("http://example.com/checkout/gateway/verify")
            .json(&confirmation())
            .send(&make_service(mocks))
            .await;

        let body: CheckoutResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::CREATED));
        assert!(body.success, "expected success, got {body:?}");
        assert_eq!(
            body.orders.first().map(|order| order.payment_method.as_str()),
            Some("gateway")
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_replayed_payment_returns_409() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .checkout
            .expect_confirm_gateway_checkout()
            .once()
            .return_once(|_, _, _| Err(CheckoutError::AlreadyProcessed));

        let mut res = TestClient::post("http://example.com/checkout/gateway/verify")
            .json(&confirmation())
            .send(&make_service(mocks))
            .await;

        let body: CheckoutResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));
        assert!(!body.success, "expected a rejection, got {body:?}");

        Ok(())
    }

    #[tokio::test]
    async fn test_bad_signature_returns_422() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .checkout
            .expect_confirm_gateway_checkout()
            .once()
            .return_once(|_, _, _| Err(CheckoutError::Capture(CaptureError::SignatureMismatch)));

        let res = TestClient::post("http://example.com/checkout/gateway/verify")
            .json(&confirmation())
            .send(&make_service(mocks))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNPROCESSABLE_ENTITY));

        Ok(())
    }

    #[tokio::test]
    async fn test_blank_signature_returns_400() -> TestResult {
        let mut mocks = Mocks::default();

        mocks.checkout.expect_confirm_gateway_checkout().never();

        let res = TestClient::post("http://example.com/checkout/gateway/verify")
            .json(&json!({
                "gateway_order_id": "order_001",
                "gateway_payment_id": "pay_001",
                "signature": "",
            }))
            .send(&make_service(mocks))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}
