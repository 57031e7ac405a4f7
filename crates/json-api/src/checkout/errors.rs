//! Errors

use salvo::{http::StatusError, prelude::*};
use tracing::{error, warn};

use emporium_app::domain::{
    checkout::CheckoutError,
    coupons::CouponRejection,
    payments::{CaptureError, GatewayError},
};

use crate::{carts::responses::InvalidLineResponse, checkout::models::CheckoutResponse};

/// How a failed checkout is reported.
#[derive(Debug)]
pub(crate) enum CheckoutFailure {
    /// A business outcome, answered with a structured body.
    Rejected(StatusCode, CheckoutResponse),

    /// A request or infrastructure fault.
    Failed(StatusError),
}

impl CheckoutFailure {
    pub(crate) const fn outcome(&self) -> &'static str {
        match self {
            Self::Rejected(..) => "rejected",
            Self::Failed(_) => "failed",
        }
    }

    /// Write a rejection body onto `res`, or surface the fault.
    pub(crate) fn respond(self, res: &mut Response) -> Result<Json<CheckoutResponse>, StatusError> {
        match self {
            Self::Rejected(status, body) => {
                res.status_code(status);

                Ok(Json(body))
            }
            Self::Failed(status) => Err(status),
        }
    }
}

pub(crate) fn into_failure(error: CheckoutError) -> CheckoutFailure {
    use CheckoutFailure::{Failed, Rejected};

    if !matches!(
        error,
        CheckoutError::Sql(_)
            | CheckoutError::Gateway(_)
            | CheckoutError::Capture(CaptureError::Gateway(_))
    ) {
        warn!("checkout rejected: {error}");
    }

    match error {
        CheckoutError::AddressNotFound => {
            Failed(StatusError::not_found().brief("Address not found"))
        }
        CheckoutError::NotFound => {
            Failed(StatusError::not_found().brief("Pending checkout not found"))
        }
        CheckoutError::UnsupportedMethod => Failed(
            StatusError::bad_request().brief("Gateway payments use the gateway checkout"),
        ),
        CheckoutError::InvalidReference | CheckoutError::InvalidData => {
            Failed(StatusError::bad_request().brief("Invalid checkout payload"))
        }
        CheckoutError::StockUnavailable(lines) => Rejected(
            StatusCode::CONFLICT,
            CheckoutResponse {
                invalid_lines: lines.into_iter().map(InvalidLineResponse::from).collect(),
                ..CheckoutResponse::rejected("Some cart lines cannot be fulfilled")
            },
        ),
        CheckoutError::CouponRejected(rejection) => Rejected(
            StatusCode::CONFLICT,
            CheckoutResponse {
                coupon_rejection: rejection_reason(rejection),
                ..CheckoutResponse::rejected(format!(
                    "Coupon removed from cart: {rejection}"
                ))
            },
        ),
        error @ (CheckoutError::EmptyCart
        | CheckoutError::StockChanged
        | CheckoutError::NothingToPay
        | CheckoutError::Expired
        | CheckoutError::AlreadyProcessed) => Rejected(
            StatusCode::CONFLICT,
            CheckoutResponse::rejected(capitalize(&error.to_string())),
        ),
        CheckoutError::InsufficientBalance => Rejected(
            StatusCode::UNPROCESSABLE_ENTITY,
            CheckoutResponse::rejected("Insufficient wallet balance"),
        ),
        CheckoutError::Capture(CaptureError::Gateway(source)) | CheckoutError::Gateway(source) => {
            Failed(gateway_failure(&source))
        }
        CheckoutError::Capture(rejection) => Rejected(
            StatusCode::UNPROCESSABLE_ENTITY,
            CheckoutResponse::rejected(capitalize(&rejection.to_string())),
        ),
        CheckoutError::Sql(source) => {
            error!("checkout storage failure: {source}");

            Failed(StatusError::internal_server_error())
        }
    }
}

pub(crate) fn gateway_failure(source: &GatewayError) -> StatusError {
    error!("payment gateway failure: {source}");

    StatusError::bad_gateway().brief("Payment gateway unavailable")
}

fn rejection_reason(rejection: CouponRejection) -> Option<String> {
    serde_json::to_value(rejection).ok().and_then(|value| {
        value
            .get("reason")
            .and_then(|reason| reason.as_str())
            .map(str::to_string)
    })
}

pub(crate) fn capitalize(message: &str) -> String {
    let mut chars = message.chars();

    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use emporium_app::domain::{
        carts::{InvalidLine, StockIssue, records::CartItemUuid},
        products::records::{ProductUuid, Size},
    };

    use testresult::TestResult;

    use super::*;

    #[test]
    fn stock_rejections_carry_invalid_lines() -> TestResult {
        let failure = into_failure(CheckoutError::StockUnavailable(vec![InvalidLine {
            item_uuid: CartItemUuid::new(),
            product_uuid: ProductUuid::new(),
            size: Size::Small,
            quantity: 11,
            issue: StockIssue::MoreThanTen,
        }]));

        let CheckoutFailure::Rejected(status, body) = failure else {
            return Err(format!("expected a rejection, got {failure:?}").into());
        };

        assert_eq!(status, StatusCode::CONFLICT);
        assert!(!body.success, "expected success to be false");
        assert_eq!(
            body.invalid_lines.first().map(|line| line.reason.as_str()),
            Some("More than 10")
        );

        Ok(())
    }

    #[test]
    fn coupon_rejections_name_the_reason() -> TestResult {
        let failure = into_failure(CheckoutError::CouponRejected(
            CouponRejection::FirstPurchaseOnly,
        ));

        let CheckoutFailure::Rejected(_, body) = failure else {
            return Err(format!("expected a rejection, got {failure:?}").into());
        };

        assert_eq!(body.coupon_rejection.as_deref(), Some("firstPurchaseOnly"));

        Ok(())
    }

    #[test]
    fn signature_mismatch_is_unprocessable() {
        let failure = into_failure(CheckoutError::Capture(CaptureError::SignatureMismatch));

        assert!(
            matches!(
                &failure,
                CheckoutFailure::Rejected(status, _) if *status == StatusCode::UNPROCESSABLE_ENTITY
            ),
            "expected 422 rejection, got {failure:?}"
        );
    }

    #[test]
    fn gateway_faults_are_bad_gateway() {
        let failure = into_failure(CheckoutError::Gateway(GatewayError::UnexpectedResponse(
            "500".to_string(),
        )));

        assert!(
            matches!(&failure, CheckoutFailure::Failed(status) if status.code == StatusCode::BAD_GATEWAY),
            "expected 502, got {failure:?}"
        );
    }

    #[test]
    fn capitalize_uppercases_the_first_letter() {
        assert_eq!(capitalize("cart is empty"), "Cart is empty");
        assert_eq!(capitalize(""), "");
    }
}
