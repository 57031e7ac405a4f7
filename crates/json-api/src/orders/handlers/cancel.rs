//! Cancel Order Handler

use std::sync::Arc;

use jiff::Timestamp;
use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    extensions::*,
    orders::{errors::into_status_error, responses::OrderResponse},
    state::State,
};

/// Cancel Order Handler
///
/// Restores the order's stock and refunds prepaid orders to the wallet.
#[endpoint(
    tags("orders"),
    summary = "Cancel Order",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Order cancelled"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
        (status_code = StatusCode::CONFLICT, description = "Order cannot be cancelled"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "orders.cancel",
    skip(order, depot),
    fields(user_uuid = tracing::field::Empty, order_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<OrderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_or_401()?;
    let order = order.into_inner();

    let span = tracing::Span::current();

    span.record("user_uuid", tracing::field::display(user));
    span.record("order_uuid", tracing::field::display(order));

    let order = state
        .app
        .orders
        .cancel_order(user, order.into(), Timestamp::now())
        .await
        .map_err(into_status_error)?;

    Ok(Json(order.into()))
}

#[cfg(test)]
mod tests {
    use emporium_app::domain::orders::{
        OrdersServiceError, TransitionError,
        records::{OrderStatus, OrderUuid},
    };
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use crate::{
        orders::handlers::tests::make_order,
        test_helpers::{Mocks, TEST_USER, customer_service},
    };

    use super::*;

    fn make_service(mocks: Mocks) -> Service {
        customer_service(mocks, Router::with_path("orders/{order}/cancel").post(handler))
    }

    #[tokio::test]
    async fn test_cancel_order() -> TestResult {
        let order = OrderUuid::new();

        let mut mocks = Mocks::default();

        mocks
            .orders
            .expect_cancel_order()
            .once()
            .withf(move |user, requested, _| *user == TEST_USER && *requested == order)
            .return_once(move |_, _, _| Ok(make_order(order, OrderStatus::Cancelled)));

        let mut res = TestClient::post(format!("http://example.com/orders/{order}/cancel"))
            .send(&make_service(mocks))
            .await;

        let body: OrderResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.status, "cancelled");

        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_delivered_order_returns_409() -> TestResult {
        let mut mocks = Mocks::default();

        mocks.orders.expect_cancel_order().once().return_once(|_, _, _| {
            Err(OrdersServiceError::Transition(
                TransitionError::InvalidTransition {
                    from: OrderStatus::Delivered,
                    to: OrderStatus::Cancelled,
                },
            ))
        });

        let res = TestClient::post(format!(
            "http://example.com/orders/{}/cancel",
            Uuid::now_v7()
        ))
        .send(&make_service(mocks))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));

        Ok(())
    }
}
