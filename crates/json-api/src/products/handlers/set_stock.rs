//! Set Product Stock Handler

use std::sync::Arc;

use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use emporium_app::domain::{
    pricing::Percentage,
    products::{data::StockUpdate, records::Size},
};

use crate::{
    extensions::*,
    products::{errors::into_status_error, get::ProductResponse},
    state::State,
};

/// Set Stock Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct SetStockRequest {
    pub size: String,

    /// New available quantity; sold counts are left alone
    pub available: u32,
}

/// Set Product Stock Handler
#[endpoint(
    tags("admin"),
    summary = "Set Product Stock",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Stock updated"),
        (status_code = StatusCode::NOT_FOUND, description = "Product not found"),
        (status_code = StatusCode::FORBIDDEN, description = "Admin access required"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "admin.products.set_stock",
    skip(product, json, depot),
    fields(product_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    product: PathParam<Uuid>,
    json: JsonBody<SetStockRequest>,
    depot: &mut Depot,
) -> Result<Json<ProductResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    depot.admin_or_403()?;

    let product = product.into_inner();
    let request = json.into_inner();

    tracing::Span::current().record("product_uuid", tracing::field::display(product));

    let update = StockUpdate {
        size: request.size.parse::<Size>().or_400("unknown size")?,
        available: request.available,
    };

    let product = state
        .app
        .products
        .set_stock(product.into(), update)
        .await
        .map_err(into_status_error)?;

    Ok(Json(ProductResponse::new(product, Percentage::ZERO)))
}

#[cfg(test)]
mod tests {
    use emporium_app::domain::products::{ProductsServiceError, records::ProductUuid};
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use crate::{
        products::handlers::tests::make_product,
        test_helpers::{Mocks, admin_service},
    };

    use super::*;

    fn make_service(mocks: Mocks) -> Service {
        admin_service(
            mocks,
            Router::with_path("admin/products/{product}/stock").put(handler),
        )
    }

    #[tokio::test]
    async fn test_set_stock() -> TestResult {
        let product = ProductUuid::new();

        let mut mocks = Mocks::default();

        mocks
            .products
            .expect_set_stock()
            .once()
            .withf(move |requested, update| {
                *requested == product
                    && *update
                        == StockUpdate {
                            size: Size::Medium,
                            available: 7,
                        }
            })
            .return_once(move |_, update| {
                Ok(make_product(product, &[(update.size, update.available)]))
            });

        let mut res = TestClient::put(format!("http://example.com/admin/products/{product}/stock"))
            .json(&json!({ "size": "medium", "available": 7 }))
            .send(&make_service(mocks))
            .await;

        let body: ProductResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.stock.first().map(|s| s.available), Some(7));

        Ok(())
    }

    #[tokio::test]
    async fn test_set_stock_on_missing_product_returns_404() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .products
            .expect_set_stock()
            .once()
            .return_once(|_, _| Err(ProductsServiceError::NotFound));

        let res = TestClient::put(format!(
            "http://example.com/admin/products/{}/stock",
            Uuid::now_v7()
        ))
        .json(&json!({ "size": "medium", "available": 7 }))
        .send(&make_service(mocks))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }
}
