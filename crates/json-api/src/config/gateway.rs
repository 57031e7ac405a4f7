//! Payment Gateway Config

use clap::Args;
use emporium_app::domain::payments::GatewayConfig;

/// Credentials for the Razorpay-compatible payment gateway.
#[derive(Debug, Args)]
pub struct GatewayArgs {
    /// Gateway API root
    #[arg(long, env = "GATEWAY_BASE_URL", default_value = "https://api.razorpay.com")]
    pub gateway_base_url: String,

    /// Public key id handed to the checkout widget
    #[arg(long, env = "GATEWAY_KEY_ID")]
    pub gateway_key_id: String,

    /// Key secret for API calls and signature checks
    #[arg(long, env = "GATEWAY_KEY_SECRET", hide_env_values = true)]
    pub gateway_key_secret: String,

    /// ISO currency code gateway orders are created in
    #[arg(long, env = "GATEWAY_CURRENCY", default_value = "INR")]
    pub gateway_currency: String,
}

impl GatewayArgs {
    /// Convert into the app-level gateway configuration.
    #[must_use]
    pub fn to_gateway_config(&self) -> GatewayConfig {
        GatewayConfig::new(
            self.gateway_base_url.trim_end_matches('/'),
            self.gateway_key_id.clone(),
            self.gateway_key_secret.clone(),
            self.gateway_currency.clone(),
        )
    }
}
