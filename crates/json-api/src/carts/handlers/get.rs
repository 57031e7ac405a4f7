//! Get Cart Handler

use std::sync::Arc;

use salvo::{oapi::extract::QueryParam, prelude::*};

use crate::{
    carts::{errors::into_status_error, responses::CartResponse},
    extensions::*,
    state::State,
};

/// Get Cart Handler
///
/// Prices the caller's cart at the requested point in time.
#[endpoint(
    tags("carts"),
    summary = "Get Cart",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Cart found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Unauthorized"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    at: QueryParam<String, false>,
    depot: &mut Depot,
) -> Result<Json<CartResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_or_401()?;
    let at = at.into_point_in_time()?;

    let cart = state
        .app
        .carts
        .get_cart(user, at)
        .await
        .map_err(into_status_error)?;

    Ok(Json(cart.into()))
}

#[cfg(test)]
mod tests {
    use emporium_app::domain::carts::{CartsServiceError, records::CartItemUuid};
    use jiff::Timestamp;
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use crate::{
        carts::handlers::tests::{make_cart, make_line},
        test_helpers::{Mocks, TEST_USER, customer_service},
    };

    use super::*;

    fn make_service(mocks: Mocks) -> Service {
        customer_service(mocks, Router::with_path("cart").get(handler))
    }

    #[tokio::test]
    async fn test_get_cart_success() -> TestResult {
        let item = CartItemUuid::new();
        let cart = make_cart(vec![make_line(item, 2)]);

        let mut mocks = Mocks::default();

        mocks
            .carts
            .expect_get_cart()
            .once()
            .withf(|user, _| *user == TEST_USER)
            .return_once(move |_, _| Ok(cart));

        let mut res = TestClient::get("http://example.com/cart")
            .send(&make_service(mocks))
            .await;

        let body: CartResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.lines.len(), 1);
        assert_eq!(body.total_amount, 1600);
        assert_eq!(body.total_initial_amount, 2000);
        assert_eq!(body.payable_amount, 1600);

        let line = body.lines.first().ok_or("missing line")?;

        assert_eq!(line.item_uuid, item.into_uuid());
        assert_eq!(line.size, "medium");
        assert_eq!(line.discount, Some(20));

        Ok(())
    }

    #[tokio::test]
    async fn test_get_cart_at_point_in_time() -> TestResult {
        let at: Timestamp = "2026-03-01T12:00:00Z".parse()?;

        let mut mocks = Mocks::default();

        mocks
            .carts
            .expect_get_cart()
            .once()
            .withf(move |_, requested| *requested == at)
            .return_once(|_, _| Ok(make_cart(Vec::new())));

        let res = TestClient::get("http://example.com/cart?at=2026-03-01T12:00:00Z")
            .send(&make_service(mocks))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        Ok(())
    }

    #[tokio::test]
    async fn test_get_cart_bad_point_in_time_returns_400() -> TestResult {
        let mut mocks = Mocks::default();

        mocks.carts.expect_get_cart().never();

        let res = TestClient::get("http://example.com/cart?at=yesterday")
            .send(&make_service(mocks))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_get_cart_storage_failure_returns_500() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .carts
            .expect_get_cart()
            .once()
            .return_once(|_, _| Err(CartsServiceError::Sql(sqlx::Error::PoolTimedOut)));

        let res = TestClient::get("http://example.com/cart")
            .send(&make_service(mocks))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::INTERNAL_SERVER_ERROR));

        Ok(())
    }
}
