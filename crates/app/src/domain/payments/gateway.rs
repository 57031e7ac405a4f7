//! Payment gateway client.

use std::fmt;

use async_trait::async_trait;
use mockall::automock;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::domain::payments::signature;

/// Connection settings for a Razorpay-compatible gateway.
#[derive(Clone)]
pub struct GatewayConfig {
    /// Gateway API root, e.g. `"https://api.razorpay.com"`.
    pub base_url: String,

    /// Public key id, also handed to the browser checkout widget.
    pub key_id: String,

    /// Key secret used for basic auth and signature checks.
    pub key_secret: Zeroizing<String>,

    /// ISO currency code orders are created in.
    pub currency: String,
}

impl GatewayConfig {
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        key_id: impl Into<String>,
        key_secret: String,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            key_id: key_id.into(),
            key_secret: Zeroizing::new(key_secret),
            currency: currency.into(),
        }
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("base_url", &self.base_url)
            .field("key_id", &self.key_id)
            .field("key_secret", &"**redacted**")
            .field("currency", &self.currency)
            .finish()
    }
}

/// An order created on the gateway, awaiting payment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: u64,
    pub currency: String,
}

/// A payment as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GatewayPayment {
    pub id: String,
    pub order_id: Option<String>,
    pub status: String,
    pub amount: u64,
}

impl GatewayPayment {
    #[must_use]
    pub fn is_captured(&self) -> bool {
        self.status == "captured"
    }
}

#[automock]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Public key id for the browser checkout widget.
    fn key_id(&self) -> String;

    /// Currency orders are created in.
    fn currency(&self) -> String;

    /// Create a remote order for `amount` minor units.
    async fn create_order(&self, amount: u64, receipt: &str) -> Result<GatewayOrder, GatewayError>;

    /// Fetch the current state of a payment.
    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, GatewayError>;

    /// Check the signature relayed by the customer's browser.
    fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool;
}

/// HTTP client for a Razorpay-compatible gateway.
#[derive(Debug, Clone)]
pub struct RazorpayGateway {
    config: GatewayConfig,
    http: Client,
}

impl RazorpayGateway {
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    async fn parse<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
        action: &str,
    ) -> Result<T, GatewayError> {
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(GatewayError::UnexpectedResponse(format!(
                "{action} failed with status {status}: {text}"
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    fn key_id(&self) -> String {
        self.config.key_id.clone()
    }

    fn currency(&self) -> String {
        self.config.currency.clone()
    }

    async fn create_order(&self, amount: u64, receipt: &str) -> Result<GatewayOrder, GatewayError> {
        let url = format!("{}/v1/orders", self.config.base_url);

        let body = serde_json::json!({
            "amount": amount,
            "currency": self.config.currency,
            "receipt": receipt,
        });

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.config.key_id, Some(self.config.key_secret.as_str()))
            .json(&body)
            .send()
            .await?;

        Self::parse(response, "create order").await
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, GatewayError> {
        let url = format!("{}/v1/payments/{payment_id}", self.config.base_url);

        let response = self
            .http
            .get(&url)
            .basic_auth(&self.config.key_id, Some(self.config.key_secret.as_str()))
            .send()
            .await?;

        Self::parse(response, "fetch payment").await
    }

    fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        signature::verify(
            self.config.key_secret.as_bytes(),
            order_id,
            payment_id,
            signature,
        )
    }
}

/// Errors that can occur when talking to the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway returned a non-2xx response or unexpected body.
    #[error("unexpected response from gateway: {0}")]
    UnexpectedResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> RazorpayGateway {
        RazorpayGateway::new(GatewayConfig {
            base_url: "http://localhost:0".to_string(),
            key_id: "rzp_test_key".to_string(),
            key_secret: Zeroizing::new("shh".to_string()),
            currency: "INR".to_string(),
        })
    }

    #[test]
    fn debug_output_redacts_the_secret() {
        let rendered = format!("{:?}", gateway());

        assert!(!rendered.contains("shh"), "secret leaked: {rendered}");
        assert!(rendered.contains("rzp_test_key"), "key id missing: {rendered}");
    }

    #[test]
    fn verifies_signatures_issued_under_its_secret() {
        let gateway = gateway();
        let issued = signature::sign(b"shh", "order_9", "pay_9").expect("hmac accepts any key");

        assert!(gateway.verify_signature("order_9", "pay_9", &issued));
        assert!(!gateway.verify_signature("order_9", "pay_8", &issued));
    }

    #[test]
    fn only_captured_payments_count() {
        let payment = |status: &str| GatewayPayment {
            id: "pay_1".to_string(),
            order_id: Some("order_1".to_string()),
            status: status.to_string(),
            amount: 100,
        };

        assert!(payment("captured").is_captured());
        assert!(!payment("authorized").is_captured());
        assert!(!payment("failed").is_captured());
    }
}
