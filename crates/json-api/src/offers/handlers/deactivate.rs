//! Deactivate Offer Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{extensions::*, offers::errors::into_status_error, state::State};

/// Deactivate Offer Handler
///
/// The offer stops applying immediately but stays listed.
#[endpoint(
    tags("admin"),
    summary = "Deactivate Offer",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::NO_CONTENT, description = "Offer deactivated"),
        (status_code = StatusCode::NOT_FOUND, description = "Offer not found"),
        (status_code = StatusCode::FORBIDDEN, description = "Admin access required"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    offer: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<StatusCode, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    depot.admin_or_403()?;

    let offer = offer.into_inner().into();

    state
        .app
        .offers
        .deactivate_offer(offer)
        .await
        .map_err(into_status_error)?;

    tracing::info!(offer_uuid = %offer, "deactivated offer");

    Ok(StatusCode::NO_CONTENT)
}
