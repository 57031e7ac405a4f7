//! List Orders Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{
    extensions::*,
    orders::{errors::into_status_error, responses::OrderResponse},
    state::State,
};

/// Orders Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrdersResponse {
    pub orders: Vec<OrderResponse>,
}

/// List Orders Handler
#[endpoint(
    tags("orders"),
    summary = "List Orders",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Orders, newest first"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Unauthorized"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<OrdersResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_or_401()?;

    let orders = state
        .app
        .orders
        .list_orders(user)
        .await
        .map_err(into_status_error)?;

    Ok(Json(OrdersResponse {
        orders: orders.into_iter().map(OrderResponse::from).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use emporium_app::domain::orders::records::{OrderStatus, OrderUuid};
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use crate::{
        orders::handlers::tests::make_order,
        test_helpers::{Mocks, TEST_USER, customer_service},
    };

    use super::*;

    #[tokio::test]
    async fn test_list_orders() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .orders
            .expect_list_orders()
            .once()
            .withf(|user| *user == TEST_USER)
            .return_once(|_| {
                Ok(vec![
                    make_order(OrderUuid::new(), OrderStatus::Placed),
                    make_order(OrderUuid::new(), OrderStatus::Delivered),
                ])
            });

        let service = customer_service(mocks, Router::with_path("orders").get(handler));

        let mut res = TestClient::get("http://example.com/orders")
            .send(&service)
            .await;

        let body: OrdersResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.orders.len(), 2);
        assert_eq!(
            body.orders.last().map(|order| order.status.as_str()),
            Some("delivered")
        );

        Ok(())
    }
}
