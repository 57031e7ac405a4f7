//! Remove Coupon Handler

use std::sync::Arc;

use salvo::{oapi::extract::QueryParam, prelude::*};

use crate::{
    carts::{errors::into_status_error, responses::CartResponse},
    extensions::*,
    state::State,
};

/// Remove Coupon Handler
#[endpoint(
    tags("carts"),
    summary = "Remove Coupon",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Coupon removed"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
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
        .remove_coupon(user, at)
        .await
        .map_err(into_status_error)?;

    Ok(Json(cart.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use crate::{
        carts::handlers::tests::make_cart,
        test_helpers::{Mocks, TEST_USER, customer_service},
    };

    use super::*;

    #[tokio::test]
    async fn test_remove_coupon() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .carts
            .expect_remove_coupon()
            .once()
            .withf(|user, _| *user == TEST_USER)
            .return_once(|_, _| Ok(make_cart(Vec::new())));

        let service = customer_service(mocks, Router::with_path("cart/coupon").delete(handler));

        let mut res = TestClient::delete("http://example.com/cart/coupon")
            .send(&service)
            .await;

        let body: CartResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert!(body.coupon.is_none(), "expected no coupon, got {body:?}");

        Ok(())
    }
}
