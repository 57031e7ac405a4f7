//! Errors

use salvo::http::StatusError;
use tracing::error;

use emporium_app::domain::addresses::AddressesServiceError;

pub(crate) fn into_status_error(error: AddressesServiceError) -> StatusError {
    match error {
        AddressesServiceError::AlreadyExists => {
            StatusError::conflict().brief("Address already exists")
        }
        AddressesServiceError::NotFound => StatusError::not_found().brief("Address not found"),
        AddressesServiceError::InvalidReference | AddressesServiceError::MissingRequiredData => {
            StatusError::bad_request().brief("Invalid address payload")
        }
        AddressesServiceError::Sql(source) => {
            error!("address storage failure: {source}");

            StatusError::internal_server_error()
        }
    }
}
