//! Errors

use salvo::http::StatusError;
use tracing::error;

use emporium_app::domain::offers::OffersServiceError;

pub(crate) fn into_status_error(error: OffersServiceError) -> StatusError {
    match error {
        OffersServiceError::AlreadyExists => StatusError::conflict().brief("Offer already exists"),
        OffersServiceError::NotFound => StatusError::not_found().brief("Offer not found"),
        OffersServiceError::InvalidReference => {
            StatusError::bad_request().brief("Offer target does not exist")
        }
        OffersServiceError::InvalidData => StatusError::bad_request().brief("Invalid offer payload"),
        OffersServiceError::Sql(source) => {
            error!("offer storage failure: {source}");

            StatusError::internal_server_error()
        }
    }
}
