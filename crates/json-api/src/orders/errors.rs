//! Errors

use salvo::http::StatusError;
use tracing::error;

use emporium_app::domain::orders::{OrdersServiceError, TransitionError};

pub(crate) fn into_status_error(error: OrdersServiceError) -> StatusError {
    match error {
        OrdersServiceError::NotFound => StatusError::not_found().brief("Order not found"),
        OrdersServiceError::Transition(rejection @ TransitionError::AdminOnly { .. }) => {
            StatusError::forbidden().brief(rejection.to_string())
        }
        OrdersServiceError::Transition(rejection @ TransitionError::InvalidTransition { .. }) => {
            StatusError::conflict().brief(rejection.to_string())
        }
        OrdersServiceError::Transition(rejection @ TransitionError::ReturnWindowClosed) => {
            StatusError::unprocessable_entity().brief(rejection.to_string())
        }
        OrdersServiceError::ReversalConflict => {
            error!("order reversal conflicts with payment or stock records");

            StatusError::conflict().brief("Order cannot be reversed")
        }
        OrdersServiceError::InvalidReference | OrdersServiceError::InvalidData => {
            StatusError::bad_request().brief("Invalid order payload")
        }
        OrdersServiceError::Sql(source) => {
            error!("order storage failure: {source}");

            StatusError::internal_server_error()
        }
    }
}
