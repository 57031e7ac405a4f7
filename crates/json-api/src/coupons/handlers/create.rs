//! Create Coupon Handler

use std::sync::Arc;

use jiff::Timestamp;
use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use emporium_app::domain::coupons::{
    data::NewCoupon,
    records::{CouponRecord, CouponUuid},
};

use crate::{coupons::errors::into_status_error, extensions::*, state::State};

/// Create Coupon Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreateCouponRequest {
    /// Case-sensitive code customers enter
    pub code: String,

    /// Cart total the coupon requires, in minor units
    #[serde(default)]
    pub minimum_purchase: u64,

    /// Flat amount taken off the cart, in minor units
    pub discount_amount: u64,

    /// RFC 3339 timestamp
    pub valid_from: String,

    /// RFC 3339 timestamp; open-ended when absent
    #[serde(default)]
    pub valid_upto: Option<String>,
}

impl TryFrom<CreateCouponRequest> for NewCoupon {
    type Error = StatusError;

    fn try_from(request: CreateCouponRequest) -> Result<Self, Self::Error> {
        if request.code.trim().is_empty() || request.code.trim() != request.code {
            return Err(StatusError::bad_request()
                .brief("Coupon code must be non-blank without surrounding spaces"));
        }

        if request.discount_amount == 0 {
            return Err(StatusError::bad_request().brief("Discount amount must be positive"));
        }

        let valid_from = request
            .valid_from
            .parse::<Timestamp>()
            .or_400("could not parse valid_from")?;

        let valid_upto = request
            .valid_upto
            .map(|value| value.parse::<Timestamp>())
            .transpose()
            .or_400("could not parse valid_upto")?;

        if valid_upto.is_some_and(|upto| upto < valid_from) {
            return Err(StatusError::bad_request().brief("valid_upto precedes valid_from"));
        }

        Ok(NewCoupon {
            uuid: CouponUuid::new(),
            code: request.code,
            minimum_purchase: request.minimum_purchase,
            discount_amount: request.discount_amount,
            valid_from,
            valid_upto,
        })
    }
}

/// Coupon Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CouponResponse {
    pub uuid: Uuid,
    pub code: String,
    pub minimum_purchase: u64,
    pub discount_amount: u64,
    pub valid_from: String,
    pub valid_upto: Option<String>,
    pub is_active: bool,
}

impl From<CouponRecord> for CouponResponse {
    fn from(coupon: CouponRecord) -> Self {
        Self {
            uuid: coupon.uuid.into_uuid(),
            code: coupon.code,
            minimum_purchase: coupon.minimum_purchase,
            discount_amount: coupon.discount_amount,
            valid_from: coupon.valid_from.to_string(),
            valid_upto: coupon.valid_upto.as_ref().map(ToString::to_string),
            is_active: coupon.is_active,
        }
    }
}

/// Create Coupon Handler
#[endpoint(
    tags("admin"),
    summary = "Create Coupon",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Coupon created"),
        (status_code = StatusCode::CONFLICT, description = "Coupon code already exists"),
        (status_code = StatusCode::FORBIDDEN, description = "Admin access required"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<CreateCouponRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<CouponResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    depot.admin_or_403()?;

    let coupon = NewCoupon::try_from(json.into_inner())?;

    let coupon = state
        .app
        .coupons
        .create_coupon(coupon)
        .await
        .map_err(into_status_error)?;

    tracing::info!(code = %coupon.code, "created coupon");

    res.status_code(StatusCode::CREATED);

    Ok(Json(coupon.into()))
}

#[cfg(test)]
mod tests {
    use emporium_app::domain::coupons::CouponsServiceError;
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use crate::test_helpers::{Mocks, admin_service};

    use super::*;

    fn make_service(mocks: Mocks) -> Service {
        admin_service(mocks, Router::with_path("admin/coupons").post(handler))
    }

    #[tokio::test]
    async fn test_create_open_ended_coupon() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .coupons
            .expect_create_coupon()
            .once()
            .withf(|new| new.code == "WELCOME" && new.valid_upto.is_none())
            .return_once(|new| {
                Ok(CouponRecord {
                    uuid: new.uuid,
                    code: new.code,
                    minimum_purchase: new.minimum_purchase,
                    discount_amount: new.discount_amount,
                    valid_from: new.valid_from,
                    valid_upto: new.valid_upto,
                    is_active: true,
                    created_at: Timestamp::UNIX_EPOCH,
                    updated_at: Timestamp::UNIX_EPOCH,
                })
            });

        let mut res = TestClient::post("http://example.com/admin/coupons")
            .json(&json!({
                "code": "WELCOME",
                "minimum_purchase": 50000,
                "discount_amount": 10000,
                "valid_from": "2026-01-01T00:00:00Z",
            }))
            .send(&make_service(mocks))
            .await;

        let body: CouponResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::CREATED));
        assert_eq!(body.code, "WELCOME");
        assert_eq!(body.valid_upto, None);

        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_code_returns_409() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .coupons
            .expect_create_coupon()
            .once()
            .return_once(|_| Err(CouponsServiceError::AlreadyExists));

        let res = TestClient::post("http://example.com/admin/coupons")
            .json(&json!({
                "code": "WELCOME",
                "discount_amount": 10000,
                "valid_from": "2026-01-01T00:00:00Z",
            }))
            .send(&make_service(mocks))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));

        Ok(())
    }

    #[tokio::test]
    async fn test_zero_discount_returns_400() -> TestResult {
        let mut mocks = Mocks::default();

        mocks.coupons.expect_create_coupon().never();

        let res = TestClient::post("http://example.com/admin/coupons")
            .json(&json!({
                "code": "NOTHING",
                "discount_amount": 0,
                "valid_from": "2026-01-01T00:00:00Z",
            }))
            .send(&make_service(mocks))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}
