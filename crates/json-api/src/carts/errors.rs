//! Errors

use salvo::http::StatusError;
use tracing::error;

use emporium_app::domain::carts::CartsServiceError;

pub(crate) fn into_status_error(error: CartsServiceError) -> StatusError {
    match error {
        CartsServiceError::NotFound => StatusError::not_found().brief("Cart item not found"),
        CartsServiceError::ProductNotFound => StatusError::not_found().brief("Product not found"),
        CartsServiceError::CouponNotFound => StatusError::not_found().brief("Coupon not found"),
        CartsServiceError::EmptyCart => StatusError::conflict().brief("Cart is empty"),
        CartsServiceError::AlreadyExists => {
            StatusError::conflict().brief("Cart item already exists")
        }
        CartsServiceError::InvalidQuantity => {
            StatusError::bad_request().brief("Quantity must be at least one")
        }
        CartsServiceError::InvalidLine(issue) => {
            StatusError::unprocessable_entity().brief(issue_reason(issue))
        }
        CartsServiceError::CouponRejected(rejection) => {
            StatusError::unprocessable_entity().brief(rejection.to_string())
        }
        CartsServiceError::InvalidReference | CartsServiceError::InvalidData => {
            StatusError::bad_request().brief("Invalid cart payload")
        }
        CartsServiceError::Sql(source) => {
            error!("cart storage failure: {source}");

            StatusError::internal_server_error()
        }
    }
}

/// The machine-readable reason string for a stock issue.
pub(crate) fn issue_reason(issue: emporium_app::domain::carts::StockIssue) -> String {
    serde_json::to_value(issue)
        .ok()
        .and_then(|value| value.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("{issue:?}"))
}

#[cfg(test)]
mod tests {
    use emporium_app::domain::{carts::StockIssue, coupons::CouponRejection};
    use salvo::http::StatusCode;

    use super::*;

    #[test]
    fn stock_issues_use_their_reason_strings() {
        assert_eq!(issue_reason(StockIssue::MoreThanTen), "More than 10");
        assert_eq!(
            issue_reason(StockIssue::MoreThanAvailable),
            "More than available stock"
        );
    }

    #[test]
    fn business_rejections_are_unprocessable() {
        let status = into_status_error(CartsServiceError::InvalidLine(StockIssue::InvalidSize));

        assert_eq!(status.code, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status.brief, "Invalid size");

        let status = into_status_error(CartsServiceError::CouponRejected(
            CouponRejection::FirstPurchaseOnly,
        ));

        assert_eq!(status.code, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
