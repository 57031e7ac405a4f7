//! Update Order Status Handler

use std::sync::Arc;

use jiff::Timestamp;
use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use emporium_app::domain::orders::records::OrderStatus;

use crate::{
    extensions::*,
    orders::{errors::into_status_error, responses::OrderResponse},
    state::State,
};

/// Update Order Status Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct UpdateOrderStatusRequest {
    /// Target status, e.g. `delivered` or `return_received`
    pub status: String,
}

/// Update Order Status Handler
#[endpoint(
    tags("admin"),
    summary = "Update Order Status",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Order status updated"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
        (status_code = StatusCode::CONFLICT, description = "Transition not allowed"),
        (status_code = StatusCode::FORBIDDEN, description = "Admin access required"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "admin.orders.update_status",
    skip(order, json, depot),
    fields(order_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    json: JsonBody<UpdateOrderStatusRequest>,
    depot: &mut Depot,
) -> Result<Json<OrderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    depot.admin_or_403()?;

    let order = order.into_inner();

    tracing::Span::current().record("order_uuid", tracing::field::display(order));

    let status = json
        .into_inner()
        .status
        .parse::<OrderStatus>()
        .or_400("unknown order status")?;

    let order = state
        .app
        .orders
        .update_status(order.into(), status, Timestamp::now())
        .await
        .map_err(into_status_error)?;

    Ok(Json(order.into()))
}

#[cfg(test)]
mod tests {
    use emporium_app::domain::orders::{
        OrdersServiceError, TransitionError, records::OrderUuid,
    };
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use crate::{
        orders::handlers::tests::make_order,
        test_helpers::{Mocks, admin_service, customer_service},
    };

    use super::*;

    fn route() -> Router {
        Router::with_path("admin/orders/{order}/status").put(handler)
    }

    #[tokio::test]
    async fn test_admin_marks_order_delivered() -> TestResult {
        let order = OrderUuid::new();

        let mut mocks = Mocks::default();

        mocks
            .orders
            .expect_update_status()
            .once()
            .withf(move |requested, status, _| {
                *requested == order && *status == OrderStatus::Delivered
            })
            .return_once(move |_, _, _| Ok(make_order(order, OrderStatus::Delivered)));

        let mut res = TestClient::put(format!("http://example.com/admin/orders/{order}/status"))
            .json(&json!({ "status": "delivered" }))
            .send(&admin_service(mocks, route()))
            .await;

        let body: OrderResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.status, "delivered");

        Ok(())
    }

    #[tokio::test]
    async fn test_customer_cannot_update_status() -> TestResult {
        let mut mocks = Mocks::default();

        mocks.orders.expect_update_status().never();

        let res = TestClient::put(format!(
            "http://example.com/admin/orders/{}/status",
            Uuid::now_v7()
        ))
        .json(&json!({ "status": "delivered" }))
        .send(&customer_service(mocks, route()))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_status_returns_400() -> TestResult {
        let mut mocks = Mocks::default();

        mocks.orders.expect_update_status().never();

        let res = TestClient::put(format!(
            "http://example.com/admin/orders/{}/status",
            Uuid::now_v7()
        ))
        .json(&json!({ "status": "shipped" }))
        .send(&admin_service(mocks, route()))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_transition_returns_409() -> TestResult {
        let mut mocks = Mocks::default();

        mocks.orders.expect_update_status().once().return_once(|_, _, _| {
            Err(OrdersServiceError::Transition(
                TransitionError::InvalidTransition {
                    from: OrderStatus::Returned,
                    to: OrderStatus::Delivered,
                },
            ))
        });

        let res = TestClient::put(format!(
            "http://example.com/admin/orders/{}/status",
            Uuid::now_v7()
        ))
        .json(&json!({ "status": "delivered" }))
        .send(&admin_service(mocks, route()))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));

        Ok(())
    }
}
