//! Errors

use salvo::http::StatusError;
use tracing::{error, warn};

use emporium_app::domain::{payments::CaptureError, wallets::WalletsServiceError};

use crate::checkout::errors::{capitalize, gateway_failure};

pub(crate) fn into_status_error(error: WalletsServiceError) -> StatusError {
    match error {
        WalletsServiceError::NotFound => StatusError::not_found().brief("Wallet or pending top-up not found"),
        WalletsServiceError::InvalidAmount => {
            StatusError::bad_request().brief("Top-up amount must be positive")
        }
        WalletsServiceError::Expired => {
            warn!("wallet top-up confirmed after expiry");

            StatusError::conflict().brief("Pending top-up has expired")
        }
        WalletsServiceError::AlreadyProcessed => {
            warn!("wallet top-up replayed");

            StatusError::conflict().brief("Payment already processed")
        }
        WalletsServiceError::Capture(CaptureError::Gateway(source))
        | WalletsServiceError::Gateway(source) => gateway_failure(&source),
        WalletsServiceError::Capture(rejection) => {
            warn!("wallet top-up rejected: {rejection}");

            StatusError::unprocessable_entity().brief(capitalize(&rejection.to_string()))
        }
        WalletsServiceError::InvalidReference | WalletsServiceError::InvalidData => {
            StatusError::bad_request().brief("Invalid wallet payload")
        }
        WalletsServiceError::Sql(source) => {
            error!("wallet storage failure: {source}");

            StatusError::internal_server_error()
        }
    }
}
