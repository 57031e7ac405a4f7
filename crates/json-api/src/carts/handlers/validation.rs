//! Cart Validation Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::QueryParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use emporium_app::domain::carts::CartValidation;

use crate::{
    carts::{
        errors::into_status_error,
        responses::{CartResponse, InvalidLineResponse},
    },
    extensions::*,
    state::State,
};

/// Cart Validation Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CartValidationResponse {
    /// Whether every line can be fulfilled
    pub success: bool,
    pub message: String,

    /// The cart as priced during validation
    pub cart: CartResponse,

    /// Lines that cannot be fulfilled, with their reasons
    pub invalid_lines: Vec<InvalidLineResponse>,
}

impl From<CartValidation> for CartValidationResponse {
    fn from(validation: CartValidation) -> Self {
        let success = validation.invalid_lines.is_empty();

        let message = if success {
            "Cart is ready for checkout".to_string()
        } else {
            format!(
                "{} cart line(s) cannot be fulfilled",
                validation.invalid_lines.len()
            )
        };

        Self {
            success,
            message,
            cart: validation.cart.into(),
            invalid_lines: validation
                .invalid_lines
                .into_iter()
                .map(InvalidLineResponse::from)
                .collect(),
        }
    }
}

/// Validate Cart Handler
///
/// Reports the lines that cannot be fulfilled and drops an applied coupon
/// that no longer qualifies.
#[endpoint(
    tags("carts"),
    summary = "Validate Cart",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Cart validated"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Unauthorized"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    at: QueryParam<String, false>,
    depot: &mut Depot,
) -> Result<Json<CartValidationResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_or_401()?;
    let at = at.into_point_in_time()?;

    let validation = state
        .app
        .carts
        .validate_cart(user, at)
        .await
        .map_err(into_status_error)?;

    Ok(Json(validation.into()))
}
