//! Product Index Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::QueryParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::{
    extensions::*, products::errors::into_status_error, products::get::ProductResponse,
    state::State,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ProductsResponse {
    /// Live products, most popular first
    pub products: Vec<ProductResponse>,
}

/// Product Index Handler
///
/// Lists products that have not been deleted, each priced at the requested
/// time. Listing does not count as a view.
#[endpoint(
    tags("products"),
    summary = "List Products",
    responses(
        (status_code = StatusCode::OK, description = "Products listed"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    at: QueryParam<String, false>,
    depot: &mut Depot,
) -> Result<Json<ProductsResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let at = at.into_point_in_time()?;

    let records = state
        .app
        .products
        .list_products()
        .await
        .map_err(into_status_error)?;

    let mut products = Vec::with_capacity(records.len());

    for product in records {
        let discount = state
            .app
            .offers
            .resolve_discount(product.uuid, at)
            .await
            .or_500("failed to resolve product discount")?;

        products.push(ProductResponse::new(product, discount));
    }

    Ok(Json(ProductsResponse { products }))
}

#[cfg(test)]
mod tests {
    use emporium_app::domain::{
        pricing::Percentage,
        products::{
            ProductsServiceError,
            records::{ProductUuid, Size},
        },
    };
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use crate::{products::handlers::tests::make_product, test_helpers::Mocks};

    use super::*;

    fn make_service(mocks: Mocks) -> Service {
        Service::new(
            Router::new()
                .hoop(salvo::affix_state::inject(mocks.into_state()))
                .push(Router::with_path("products").get(handler)),
        )
    }

    #[tokio::test]
    async fn test_index_prices_each_product() -> TestResult {
        let discounted = ProductUuid::new();
        let full_price = ProductUuid::new();
        let discount = Percentage::new(10)?;

        let mut mocks = Mocks::default();

        mocks.products.expect_view_product().never();
        mocks
            .products
            .expect_list_products()
            .once()
            .return_once(move || {
                Ok(vec![
                    make_product(discounted, &[(Size::Medium, 2)]),
                    make_product(full_price, &[]),
                ])
            });

        mocks
            .offers
            .expect_resolve_discount()
            .times(2)
            .returning(move |product, _| {
                Ok(if product == discounted {
                    discount
                } else {
                    Percentage::ZERO
                })
            });

        let mut res = TestClient::get("http://example.com/products")
            .send(&make_service(mocks))
            .await;

        let body: ProductsResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(
            body.products
                .iter()
                .map(|product| (product.uuid, product.final_price))
                .collect::<Vec<_>>(),
            vec![
                (discounted.into_uuid(), 900),
                (full_price.into_uuid(), 1000)
            ]
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_index_storage_failure_returns_500() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .products
            .expect_list_products()
            .once()
            .return_once(|| Err(ProductsServiceError::Sql(sqlx::Error::PoolTimedOut)));

        mocks.offers.expect_resolve_discount().never();

        let res = TestClient::get("http://example.com/products")
            .send(&make_service(mocks))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::INTERNAL_SERVER_ERROR));

        Ok(())
    }
}
