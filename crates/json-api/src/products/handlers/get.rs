//! Get Product Handler

use std::sync::Arc;

use salvo::{
    oapi::{
        ToSchema,
        extract::{PathParam, QueryParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use emporium_app::domain::{
    pricing::{Percentage, final_price},
    products::records::{ProductRecord, Size},
};

use crate::{extensions::*, products::errors::into_status_error, state::State};

/// Stock for one size
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct SizeStockResponse {
    pub size: String,
    pub available: u32,
    pub sold: u32,
}

/// Product Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ProductResponse {
    pub uuid: Uuid,
    pub category_uuid: Uuid,
    pub name: String,
    pub brand: String,

    /// List price in minor units
    pub price: u64,

    /// Effective discount percentage at the requested time
    pub discount: u8,

    /// Price after the discount
    pub final_price: u64,

    /// Stock per stocked size, smallest first
    pub stock: Vec<SizeStockResponse>,
}

impl ProductResponse {
    pub(crate) fn new(product: ProductRecord, discount: Percentage) -> Self {
        let stock = Size::ALL
            .into_iter()
            .filter_map(|size| {
                product.stock_for(size).map(|level| SizeStockResponse {
                    size: size.to_string(),
                    available: level.available,
                    sold: level.sold,
                })
            })
            .collect();

        Self {
            uuid: product.uuid.into_uuid(),
            category_uuid: product.category_uuid.into_uuid(),
            final_price: final_price(product.price, discount),
            discount: discount.get(),
            name: product.name,
            brand: product.brand,
            price: product.price,
            stock,
        }
    }
}

/// Get Product Handler
///
/// Counts the view towards the product's popularity.
#[endpoint(
    tags("products"),
    summary = "Get Product",
    responses(
        (status_code = StatusCode::OK, description = "Product found"),
        (status_code = StatusCode::NOT_FOUND, description = "Product not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    product: PathParam<Uuid>,
    at: QueryParam<String, false>,
    depot: &mut Depot,
) -> Result<Json<ProductResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let at = at.into_point_in_time()?;

    let product = state
        .app
        .products
        .view_product(product.into_inner().into())
        .await
        .map_err(into_status_error)?;

    let discount = state
        .app
        .offers
        .resolve_discount(product.uuid, at)
        .await
        .or_500("failed to resolve product discount")?;

    Ok(Json(ProductResponse::new(product, discount)))
}
