//! Checkout Policy Config

use clap::Args;
use emporium_app::domain::{checkout::CheckoutPolicy, coupons::CouponRules};
use jiff::SignedDuration;

/// Checkout policy settings.
#[derive(Debug, Args)]
pub struct CheckoutConfig {
    /// Coupon code reserved for a customer's first order
    #[arg(long, env = "FIRST_PURCHASE_COUPON", default_value = "WELCOME")]
    pub first_purchase_coupon: String,

    /// Minutes a gateway checkout or top-up waits for payment
    #[arg(long, env = "PENDING_CHECKOUT_TTL_MINUTES", default_value_t = 15_i64)]
    pub pending_checkout_ttl_minutes: i64,
}

impl CheckoutConfig {
    /// Build the checkout policy the services run with.
    #[must_use]
    pub fn to_policy(&self) -> CheckoutPolicy {
        CheckoutPolicy {
            coupon_rules: CouponRules {
                first_purchase_code: self.first_purchase_coupon.clone(),
            },
            pending_ttl: SignedDuration::from_mins(self.pending_checkout_ttl_minutes.max(1)),
        }
    }
}
