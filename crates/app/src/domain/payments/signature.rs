//! Gateway payment signatures
//!
//! The gateway signs `"{order_id}|{payment_id}"` with HMAC-SHA256 under the
//! merchant key secret and hands the lowercase hex digest to the customer's
//! browser, which relays it back to us.

use hmac::{Hmac, Mac, digest::InvalidLength};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Compute the hex signature the gateway would issue for this payment.
///
/// # Errors
///
/// Returns [`InvalidLength`] if the key cannot be used, which HMAC never does
/// in practice.
pub fn sign(secret: &[u8], order_id: &str, payment_id: &str) -> Result<String, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret)?;

    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());

    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Check a relayed signature in constant time.
#[must_use]
pub fn verify(secret: &[u8], order_id: &str, payment_id: &str, signature: &str) -> bool {
    let Ok(expected) = sign(secret, order_id, payment_id) else {
        return false;
    };

    let provided = signature.trim().to_ascii_lowercase();

    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test_key_secret";

    #[test]
    fn issued_signature_verifies() {
        let signature = sign(SECRET, "order_1", "pay_1").expect("hmac accepts any key");

        assert_eq!(signature.len(), 64);
        assert!(verify(SECRET, "order_1", "pay_1", &signature));
    }

    #[test]
    fn uppercase_hex_is_accepted() {
        let signature = sign(SECRET, "order_1", "pay_1").expect("hmac accepts any key");

        assert!(verify(
            SECRET,
            "order_1",
            "pay_1",
            &signature.to_ascii_uppercase()
        ));
    }

    #[test]
    fn tampered_ids_are_rejected() {
        let signature = sign(SECRET, "order_1", "pay_1").expect("hmac accepts any key");

        assert!(!verify(SECRET, "order_2", "pay_1", &signature));
        assert!(!verify(SECRET, "order_1", "pay_2", &signature));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let signature = sign(b"other", "order_1", "pay_1").expect("hmac accepts any key");

        assert!(!verify(SECRET, "order_1", "pay_1", &signature));
    }

    #[test]
    fn truncated_signature_is_rejected() {
        let signature = sign(SECRET, "order_1", "pay_1").expect("hmac accepts any key");

        assert!(!verify(SECRET, "order_1", "pay_1", signature.get(..32).unwrap_or("")));
        assert!(!verify(SECRET, "order_1", "pay_1", ""));
    }
}
