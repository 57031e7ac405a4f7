//! Gateway capture checks

use thiserror::Error;
use tracing::warn;

use crate::domain::payments::{
    gateway::{GatewayError, GatewayPayment, PaymentGateway},
    records::GatewayReference,
};

/// Reasons a gateway confirmation cannot be trusted.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("payment signature does not match")]
    SignatureMismatch,

    #[error("payment has not been captured")]
    NotCaptured,

    #[error("payment belongs to a different gateway order")]
    OrderMismatch,

    #[error("captured amount {captured} does not match expected {expected}")]
    AmountMismatch { expected: u64, captured: u64 },

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Check a relayed confirmation against the gateway.
///
/// The signature is checked locally first so that forged confirmations never
/// reach the gateway. The payment must then be captured, belong to the
/// referenced gateway order and carry exactly `expected_amount`.
///
/// # Errors
///
/// Returns a [`CaptureError`] naming the first check that failed.
pub async fn verify_capture(
    gateway: &dyn PaymentGateway,
    reference: &GatewayReference,
    expected_amount: u64,
) -> Result<GatewayPayment, CaptureError> {
    if !gateway.verify_signature(
        &reference.order_id,
        &reference.payment_id,
        &reference.signature,
    ) {
        warn!(gateway_order_id = %reference.order_id, "gateway signature mismatch");

        return Err(CaptureError::SignatureMismatch);
    }

    let payment = gateway.fetch_payment(&reference.payment_id).await?;

    if !payment.is_captured() {
        return Err(CaptureError::NotCaptured);
    }

    if payment.order_id.as_deref() != Some(reference.order_id.as_str()) {
        return Err(CaptureError::OrderMismatch);
    }

    if payment.amount != expected_amount {
        return Err(CaptureError::AmountMismatch {
            expected: expected_amount,
            captured: payment.amount,
        });
    }

    Ok(payment)
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;
    use testresult::TestResult;

    use crate::domain::payments::gateway::MockPaymentGateway;

    use super::*;

    fn reference() -> GatewayReference {
        GatewayReference {
            order_id: "order_1".to_string(),
            payment_id: "pay_1".to_string(),
            signature: "sig".to_string(),
        }
    }

    fn payment(status: &str, order_id: &str, amount: u64) -> GatewayPayment {
        GatewayPayment {
            id: "pay_1".to_string(),
            order_id: Some(order_id.to_string()),
            status: status.to_string(),
            amount,
        }
    }

    fn gateway_returning(found: GatewayPayment) -> MockPaymentGateway {
        let mut gateway = MockPaymentGateway::new();

        gateway.expect_verify_signature().return_const(true);
        gateway
            .expect_fetch_payment()
            .with(eq("pay_1"))
            .return_once(move |_| Ok(found));

        gateway
    }

    #[tokio::test]
    async fn accepts_a_captured_payment_for_the_expected_amount() -> TestResult {
        let gateway = gateway_returning(payment("captured", "order_1", 1_500));

        let captured = verify_capture(&gateway, &reference(), 1_500).await?;

        assert_eq!(captured.amount, 1_500);

        Ok(())
    }

    #[tokio::test]
    async fn bad_signature_never_reaches_the_gateway() {
        let mut gateway = MockPaymentGateway::new();

        gateway.expect_verify_signature().return_const(false);
        gateway.expect_fetch_payment().never();

        let result = verify_capture(&gateway, &reference(), 1_500).await;

        assert!(
            matches!(result, Err(CaptureError::SignatureMismatch)),
            "expected SignatureMismatch, got {result:?}"
        );
    }

    #[tokio::test]
    async fn authorized_but_uncaptured_payment_is_rejected() {
        let gateway = gateway_returning(payment("authorized", "order_1", 1_500));

        let result = verify_capture(&gateway, &reference(), 1_500).await;

        assert!(
            matches!(result, Err(CaptureError::NotCaptured)),
            "expected NotCaptured, got {result:?}"
        );
    }

    #[tokio::test]
    async fn payment_for_another_order_is_rejected() {
        let gateway = gateway_returning(payment("captured", "order_2", 1_500));

        let result = verify_capture(&gateway, &reference(), 1_500).await;

        assert!(
            matches!(result, Err(CaptureError::OrderMismatch)),
            "expected OrderMismatch, got {result:?}"
        );
    }

    #[tokio::test]
    async fn short_payment_is_rejected() {
        let gateway = gateway_returning(payment("captured", "order_1", 1_499));

        let result = verify_capture(&gateway, &reference(), 1_500).await;

        assert!(
            matches!(
                result,
                Err(CaptureError::AmountMismatch {
                    expected: 1_500,
                    captured: 1_499
                })
            ),
            "expected AmountMismatch, got {result:?}"
        );
    }
}
