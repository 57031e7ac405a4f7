//! Offer Index Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{
    extensions::*,
    offers::{create::OfferResponse, errors::into_status_error},
    state::State,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OffersResponse {
    /// Every offer, deactivated and expired ones included, newest first
    pub offers: Vec<OfferResponse>,
}

/// Offer Index Handler
#[endpoint(
    tags("admin"),
    summary = "List Offers",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Offers listed"),
        (status_code = StatusCode::FORBIDDEN, description = "Admin access required"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<OffersResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    depot.admin_or_403()?;

    let offers = state
        .app
        .offers
        .list_offers()
        .await
        .map_err(into_status_error)?;

    Ok(Json(OffersResponse {
        offers: offers.into_iter().map(Into::into).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use emporium_app::domain::{
        offers::records::{OfferRecord, OfferTarget, OfferUuid},
        pricing::Percentage,
        products::records::ProductUuid,
    };
    use jiff::Timestamp;
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use crate::test_helpers::{Mocks, admin_service, customer_service};

    use super::*;

    fn route() -> Router {
        Router::with_path("admin/offers").get(handler)
    }

    #[tokio::test]
    async fn test_index_includes_inactive_offers() -> TestResult {
        let product = ProductUuid::new();
        let percentage = Percentage::new(30)?;

        let mut mocks = Mocks::default();

        mocks
            .offers
            .expect_list_offers()
            .once()
            .return_once(move || {
                Ok(vec![OfferRecord {
                    uuid: OfferUuid::new(),
                    target: OfferTarget::Product(product),
                    percentage,
                    valid_from: Timestamp::UNIX_EPOCH,
                    valid_upto: Timestamp::UNIX_EPOCH,
                    is_active: false,
                    created_at: Timestamp::UNIX_EPOCH,
                    updated_at: Timestamp::UNIX_EPOCH,
                }])
            });

        let mut res = TestClient::get("http://example.com/admin/offers")
            .send(&admin_service(mocks, route()))
            .await;

        let body: OffersResponse = res.take_json().await?;
        let offer = body.offers.first().ok_or("no offer listed")?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(offer.product_uuid, Some(product.into_uuid()));
        assert_eq!(offer.percentage, 30);
        assert!(!offer.is_active);

        Ok(())
    }

    #[tokio::test]
    async fn test_customer_cannot_list_offers() -> TestResult {
        let mut mocks = Mocks::default();

        mocks.offers.expect_list_offers().never();

        let res = TestClient::get("http://example.com/admin/offers")
            .send(&customer_service(mocks, route()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));

        Ok(())
    }
}
