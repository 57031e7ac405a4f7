//! Update Cart Item Handler

use std::sync::Arc;

use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam, QueryParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use emporium_app::domain::products::records::Size;

use crate::{
    carts::{errors::into_status_error, responses::CartResponse},
    extensions::*,
    state::State,
};

/// Update Cart Item Request
///
/// Exactly one of `quantity` and `size` must be given.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct UpdateCartItemRequest {
    #[serde(default)]
    pub quantity: Option<u32>,

    #[serde(default)]
    pub size: Option<String>,
}

/// Update Cart Item Handler
#[endpoint(
    tags("carts"),
    summary = "Update Cart Item",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Item updated"),
        (status_code = StatusCode::NOT_FOUND, description = "Cart item not found"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Line cannot be stocked"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "carts.items.update",
    skip(item, json, at, depot),
    fields(user_uuid = tracing::field::Empty, item_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    item: PathParam<Uuid>,
    json: JsonBody<UpdateCartItemRequest>,
    at: QueryParam<String, false>,
    depot: &mut Depot,
) -> Result<Json<CartResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_or_401()?;
    let at = at.into_point_in_time()?;
    let item = item.into_inner();

    let span = tracing::Span::current();

    span.record("user_uuid", tracing::field::display(user));
    span.record("item_uuid", tracing::field::display(item));

    let carts = &state.app.carts;

    let cart = match json.into_inner() {
        UpdateCartItemRequest {
            quantity: Some(quantity),
            size: None,
        } => carts
            .update_item_quantity(user, item.into(), quantity, at)
            .await,
        UpdateCartItemRequest {
            quantity: None,
            size: Some(size),
        } => {
            let size = size.parse::<Size>().or_400("unknown size")?;

            carts.update_item_size(user, item.into(), size, at).await
        }
        UpdateCartItemRequest { .. } => {
            return Err(StatusError::bad_request().brief("Provide either quantity or size"));
        }
    }
    .map_err(into_status_error)?;

    Ok(Json(cart.into()))
}
