//! Get Coupon Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};

use crate::{
    coupons::{create::CouponResponse, errors::into_status_error},
    extensions::*,
    state::State,
};

/// Get Coupon Handler
///
/// Codes are matched exactly, so `SAVE10` and `save10` are different coupons.
#[endpoint(
    tags("admin"),
    summary = "Get Coupon",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Coupon found"),
        (status_code = StatusCode::NOT_FOUND, description = "Coupon not found"),
        (status_code = StatusCode::FORBIDDEN, description = "Admin access required"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    code: PathParam<String>,
    depot: &mut Depot,
) -> Result<Json<CouponResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    depot.admin_or_403()?;

    let coupon = state
        .app
        .coupons
        .get_coupon(&code.into_inner())
        .await
        .map_err(into_status_error)?;

    Ok(Json(coupon.into()))
}
