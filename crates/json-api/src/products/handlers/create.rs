//! Create Product Handler

use std::sync::Arc;

use rustc_hash::FxHashSet;
use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use emporium_app::domain::{
    pricing::Percentage,
    products::{
        data::NewProduct,
        records::{ProductUuid, Size},
    },
};

use crate::{
    extensions::*,
    products::{errors::into_status_error, get::ProductResponse},
    state::State,
};

/// Initial stock for one size
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct SizeStockRequest {
    /// One of `small`, `medium`, `large` or `extraLarge`
    pub size: String,
    pub available: u32,
}

/// Create Product Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreateProductRequest {
    pub category_uuid: Uuid,
    pub name: String,
    pub brand: String,

    /// List price in minor units
    pub price: u64,

    /// Stocked sizes; sizes left out are not sold
    pub stock: Vec<SizeStockRequest>,
}

impl TryFrom<CreateProductRequest> for NewProduct {
    type Error = StatusError;

    fn try_from(request: CreateProductRequest) -> Result<Self, Self::Error> {
        if request.name.trim().is_empty() || request.brand.trim().is_empty() {
            return Err(StatusError::bad_request().brief("Name and brand are required"));
        }

        if request.price == 0 {
            return Err(StatusError::bad_request().brief("Price must be positive"));
        }

        let mut seen = FxHashSet::default();
        let mut stock = Vec::with_capacity(request.stock.len());

        for entry in request.stock {
            let size = entry.size.parse::<Size>().or_400("unknown size")?;

            if !seen.insert(size) {
                return Err(StatusError::bad_request().brief("Each size may only appear once"));
            }

            stock.push((size, entry.available));
        }

        Ok(NewProduct {
            uuid: ProductUuid::new(),
            category_uuid: request.category_uuid.into(),
            name: request.name,
            brand: request.brand,
            price: request.price,
            stock,
        })
    }
}

/// Create Product Handler
#[endpoint(
    tags("admin"),
    summary = "Create Product",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Product created"),
        (status_code = StatusCode::FORBIDDEN, description = "Admin access required"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "admin.products.create",
    skip(json, depot, res),
    fields(product_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<CreateProductRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<ProductResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    depot.admin_or_403()?;

    let product = NewProduct::try_from(json.into_inner())?;

    tracing::Span::current().record("product_uuid", tracing::field::display(product.uuid));

    let product = state
        .app
        .products
        .create_product(product)
        .await
        .map_err(into_status_error)?;

    tracing::info!(product_uuid = %product.uuid, "created product");

    res.add_header(LOCATION, format!("/products/{}", product.uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(ProductResponse::new(product, Percentage::ZERO)))
}

#[cfg(test)]
mod tests {
    use emporium_app::domain::products::ProductsServiceError;
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use crate::{
        products::handlers::tests::make_product,
        test_helpers::{Mocks, admin_service, customer_service},
    };

    use super::*;

    fn route() -> Router {
        Router::with_path("admin/products").post(handler)
    }

    #[tokio::test]
    async fn test_create_product_success() -> TestResult {
        let category = Uuid::now_v7();

        let mut mocks = Mocks::default();

        mocks
            .products
            .expect_create_product()
            .once()
            .withf(move |new| {
                new.category_uuid.into_uuid() == category
                    && new.price == 1000
                    && new.stock == vec![(Size::Small, 3), (Size::ExtraLarge, 1)]
            })
            .return_once(|new| Ok(make_product(new.uuid, &new.stock)));

        let mut res = TestClient::post("http://example.com/admin/products")
            .json(&json!({
                "category_uuid": category,
                "name": "Linen Shirt",
                "brand": "Loom",
                "price": 1000,
                "stock": [
                    { "size": "small", "available": 3 },
                    { "size": "extraLarge", "available": 1 },
                ],
            }))
            .send(&admin_service(mocks, route()))
            .await;

        let body: ProductResponse = res.take_json().await?;
        let location = res.headers().get("location").and_then(|v| v.to_str().ok());

        assert_eq!(res.status_code, Some(StatusCode::CREATED));
        assert_eq!(location, Some(format!("/products/{}", body.uuid).as_str()));
        assert_eq!(body.stock.len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_size_returns_400() -> TestResult {
        let mut mocks = Mocks::default();

        mocks.products.expect_create_product().never();

        let res = TestClient::post("http://example.com/admin/products")
            .json(&json!({
                "category_uuid": Uuid::now_v7(),
                "name": "Linen Shirt",
                "brand": "Loom",
                "price": 1000,
                "stock": [
                    { "size": "small", "available": 3 },
                    { "size": "small", "available": 1 },
                ],
            }))
            .send(&admin_service(mocks, route()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_category_returns_400() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .products
            .expect_create_product()
            .once()
            .return_once(|_| Err(ProductsServiceError::InvalidReference));

        let res = TestClient::post("http://example.com/admin/products")
            .json(&json!({
                "category_uuid": Uuid::now_v7(),
                "name": "Linen Shirt",
                "brand": "Loom",
                "price": 1000,
                "stock": [],
            }))
            .send(&admin_service(mocks, route()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_customer_cannot_create_products() -> TestResult {
        let mut mocks = Mocks::default();

        mocks.products.expect_create_product().never();

        let res = TestClient::post("http://example.com/admin/products")
            .json(&json!({
                "category_uuid": Uuid::now_v7(),
                "name": "Linen Shirt",
                "brand": "Loom",
                "price": 1000,
                "stock": [],
            }))
            .send(&customer_service(mocks, route()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));

        Ok(())
    }
}
