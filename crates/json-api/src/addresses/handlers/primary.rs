//! Set Primary Address Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    addresses::{errors::into_status_error, index::AddressResponse},
    extensions::*,
    state::State,
};

/// Set Primary Address Handler
#[endpoint(
    tags("addresses"),
    summary = "Set Primary Address",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Address is now primary"),
        (status_code = StatusCode::NOT_FOUND, description = "Address not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    address: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<AddressResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_or_401()?;

    let address = state
        .app
        .addresses
        .set_primary(user, address.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(address.into()))
}
