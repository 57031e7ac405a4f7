//! Create Offer Handler

use std::sync::Arc;

use jiff::Timestamp;
use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use emporium_app::domain::{
    offers::{
        data::NewOffer,
        records::{OfferRecord, OfferTarget, OfferUuid},
    },
    pricing::Percentage,
};

use crate::{extensions::*, offers::errors::into_status_error, state::State};

/// Create Offer Request
///
/// Exactly one of `product_uuid` and `category_uuid` must be given.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreateOfferRequest {
    #[serde(default)]
    pub product_uuid: Option<Uuid>,

    #[serde(default)]
    pub category_uuid: Option<Uuid>,

    /// Whole-number discount, 0 to 100
    pub percentage: u8,

    /// RFC 3339 timestamp
    pub valid_from: String,

    /// RFC 3339 timestamp, inclusive
    pub valid_upto: String,
}

impl TryFrom<CreateOfferRequest> for NewOffer {
    type Error = StatusError;

    fn try_from(request: CreateOfferRequest) -> Result<Self, Self::Error> {
        let target = match (request.product_uuid, request.category_uuid) {
            (Some(product), None) => OfferTarget::Product(product.into()),
            (None, Some(category)) => OfferTarget::Category(category.into()),
            _ => {
                return Err(StatusError::bad_request()
                    .brief("Provide either product_uuid or category_uuid"));
            }
        };

        let percentage = Percentage::new(request.percentage).or_400("percentage out of range")?;

        let valid_from = request
            .valid_from
            .parse::<Timestamp>()
            .or_400("could not parse valid_from")?;

        let valid_upto = request
            .valid_upto
            .parse::<Timestamp>()
            .or_400("could not parse valid_upto")?;

        if valid_upto < valid_from {
            return Err(StatusError::bad_request().brief("valid_upto precedes valid_from"));
        }

        Ok(NewOffer {
            uuid: OfferUuid::new(),
            target,
            percentage,
            valid_from,
            valid_upto,
        })
    }
}

/// Offer Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OfferResponse {
    pub uuid: Uuid,
    pub product_uuid: Option<Uuid>,
    pub category_uuid: Option<Uuid>,
    pub percentage: u8,
    pub valid_from: String,
    pub valid_upto: String,
    pub is_active: bool,
}

impl From<OfferRecord> for OfferResponse {
    fn from(offer: OfferRecord) -> Self {
        let (product_uuid, category_uuid) = match offer.target {
            OfferTarget::Product(product) => (Some(product.into_uuid()), None),
            OfferTarget::Category(category) => (None, Some(category.into_uuid())),
        };

        Self {
            uuid: offer.uuid.into_uuid(),
            product_uuid,
            category_uuid,
            percentage: offer.percentage.get(),
            valid_from: offer.valid_from.to_string(),
            valid_upto: offer.valid_upto.to_string(),
            is_active: offer.is_active,
        }
    }
}

/// Create Offer Handler
#[endpoint(
    tags("admin"),
    summary = "Create Offer",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Offer created"),
        (status_code = StatusCode::FORBIDDEN, description = "Admin access required"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<CreateOfferRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<OfferResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    depot.admin_or_403()?;

    let offer = NewOffer::try_from(json.into_inner())?;

    let offer = state
        .app
        .offers
        .create_offer(offer)
        .await
        .map_err(into_status_error)?;

    tracing::info!(offer_uuid = %offer.uuid, percentage = offer.percentage.get(), "created offer");

    res.status_code(StatusCode::CREATED);

    Ok(Json(offer.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use crate::test_helpers::{Mocks, admin_service};

    use super::*;

    fn make_service(mocks: Mocks) -> Service {
        admin_service(mocks, Router::with_path("admin/offers").post(handler))
    }

    #[tokio::test]
    async fn test_create_category_offer() -> TestResult {
        let category = Uuid::now_v7();

        let mut mocks = Mocks::default();

        mocks
            .offers
            .expect_create_offer()
            .once()
            .withf(move |new| {
                new.target == OfferTarget::Category(category.into()) && new.percentage.get() == 25
            })
            .return_once(|new| {
                Ok(OfferRecord {
                    uuid: new.uuid,
                    target: new.target,
                    percentage: new.percentage,
                    valid_from: new.valid_from,
                    valid_upto: new.valid_upto,
                    is_active: true,
                    created_at: Timestamp::UNIX_EPOCH,
                    updated_at: Timestamp::UNIX_EPOCH,
                })
            });

        let mut res = TestClient::post("http://example.com/admin/offers")
            .json(&json!({
                "category_uuid": category,
                "percentage": 25,
                "valid_from": "2026-01-01T00:00:00Z",
                "valid_upto": "2026-01-31T23:59:59Z",
            }))
            .send(&make_service(mocks))
            .await;

        let body: OfferResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::CREATED));
        assert_eq!(body.category_uuid, Some(category));
        assert_eq!(body.product_uuid, None);

        Ok(())
    }

    #[tokio::test]
    async fn test_offer_with_two_targets_returns_400() -> TestResult {
        let mut mocks = Mocks::default();

        mocks.offers.expect_create_offer().never();

        let res = TestClient::post("http://example.com/admin/offers")
            .json(&json!({
                "product_uuid": Uuid::now_v7(),
                "category_uuid": Uuid::now_v7(),
                "percentage": 10,
                "valid_from": "2026-01-01T00:00:00Z",
                "valid_upto": "2026-01-31T23:59:59Z",
            }))
            .send(&make_service(mocks))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_offer_over_one_hundred_percent_returns_400() -> TestResult {
        let mut mocks = Mocks::default();

        mocks.offers.expect_create_offer().never();

        let res = TestClient::post("http://example.com/admin/offers")
            .json(&json!({
                "product_uuid": Uuid::now_v7(),
                "percentage": 120,
                "valid_from": "2026-01-01T00:00:00Z",
                "valid_upto": "2026-01-31T23:59:59Z",
            }))
            .send(&make_service(mocks))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_inverted_window_returns_400() -> TestResult {
        let mut mocks = Mocks::default();

        mocks.offers.expect_create_offer().never();

        let res = TestClient::post("http://example.com/admin/offers")
            .json(&json!({
                "product_uuid": Uuid::now_v7(),
                "percentage": 10,
                "valid_from": "2026-02-01T00:00:00Z",
                "valid_upto": "2026-01-01T00:00:00Z",
            }))
            .send(&make_service(mocks))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}
