//! Add Cart Item Handler

use std::sync::Arc;

use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, QueryParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use emporium_app::domain::{
    carts::{data::NewCartItem, records::CartItemUuid},
    products::records::Size,
};

use crate::{
    carts::{errors::into_status_error, responses::CartResponse},
    extensions::*,
    state::State,
};

/// Add Cart Item Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct AddCartItemRequest {
    pub product_uuid: Uuid,

    /// One of `small`, `medium`, `large` or `extraLarge`
    pub size: String,

    pub quantity: u32,
}

/// Add Cart Item Handler
///
/// Adding a product size already in the cart increases that line's quantity.
#[endpoint(
    tags("carts"),
    summary = "Add Cart Item",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Item added"),
        (status_code = StatusCode::NOT_FOUND, description = "Product not found"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Line cannot be stocked"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "carts.items.add",
    skip(json, at, depot),
    fields(user_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<AddCartItemRequest>,
    at: QueryParam<String, false>,
    depot: &mut Depot,
) -> Result<Json<CartResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_or_401()?;
    let at = at.into_point_in_time()?;
    let request = json.into_inner();

    tracing::Span::current().record("user_uuid", tracing::field::display(user));

    let size = request.size.parse::<Size>().or_400("unknown size")?;

    let item = NewCartItem {
        uuid: CartItemUuid::new(),
        product_uuid: request.product_uuid.into(),
        size,
        quantity: request.quantity,
    };

    let cart = state
        .app
        .carts
        .add_item(user, item, at)
        .await
        .map_err(into_status_error)?;

    Ok(Json(cart.into()))
}

#[cfg(test)]
mod tests {
    use emporium_app::domain::carts::{CartsServiceError, StockIssue};
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use crate::{
        carts::handlers::tests::{make_cart, make_line},
        test_helpers::{Mocks, TEST_USER, customer_service},
    };

    use super::*;

    fn make_service(mocks: Mocks) -> Service {
        customer_service(mocks, Router::with_path("cart/items").post(handler))
    }

    #[tokio::test]
    async fn test_add_item_success() -> TestResult {
        let product = Uuid::now_v7();

        let mut mocks = Mocks::default();

        mocks
            .carts
            .expect_add_item()
            .once()
            .withf(move |user, item, _| {
                *user == TEST_USER
                    && item.product_uuid.into_uuid() == product
                    && item.size == Size::ExtraLarge
                    && item.quantity == 2
            })
            .return_once(|_, item, _| Ok(make_cart(vec![make_line(item.uuid, 2)])));

        let mut res = TestClient::post("http://example.com/cart/items")
            .json(&json!({ "product_uuid": product, "size": "extraLarge", "quantity": 2 }))
            .send(&make_service(mocks))
            .await;

        let body: CartResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.lines.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_add_item_unknown_size_returns_400() -> TestResult {
        let mut mocks = Mocks::default();

        mocks.carts.expect_add_item().never();

        let res = TestClient::post("http://example.com/cart/items")
            .json(&json!({ "product_uuid": Uuid::now_v7(), "size": "XXL", "quantity": 1 }))
            .send(&make_service(mocks))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_add_item_over_limit_returns_422() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .carts
            .expect_add_item()
            .once()
            .return_once(|_, _, _| Err(CartsServiceError::InvalidLine(StockIssue::MoreThanTen)));

        let mut res = TestClient::post("http://example.com/cart/items")
            .json(&json!({ "product_uuid": Uuid::now_v7(), "size": "small", "quantity": 11 }))
            .send(&make_service(mocks))
            .await;

        let body = res.take_string().await?;

        assert_eq!(res.status_code, Some(StatusCode::UNPROCESSABLE_ENTITY));
        assert!(body.contains("More than 10"), "expected reason in body, got {body}");

        Ok(())
    }

    #[tokio::test]
    async fn test_add_item_missing_product_returns_404() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .carts
            .expect_add_item()
            .once()
            .return_once(|_, _, _| Err(CartsServiceError::ProductNotFound));

        let res = TestClient::post("http://example.com/cart/items")
            .json(&json!({ "product_uuid": Uuid::now_v7(), "size": "small", "quantity": 1 }))
            .send(&make_service(mocks))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }
}
