//! Payment provider integrations.
//!
//! - [`razorpay`] - order creation over REST and payment signature checks
//! - [`stripe`] - webhook signature verification and event parsing

pub mod razorpay;
pub mod stripe;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

pub use razorpay::{ProviderOrder, RazorpayClient};
pub use stripe::{StripeEvent, StripeVerifier, WebhookAction};

/// Errors from a payment provider.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("payment request failed: {0}")]
    Request(String),

    /// Failed to parse response.
    #[error("payment response error: {0}")]
    Response(String),

    /// Provider returned an error.
    #[error("payment provider error: {0}")]
    Api(String),

    /// Amount cannot be charged.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Payment signature did not match.
    #[error("Invalid payment signature")]
    InvalidSignature,
}

impl PaymentError {
    /// Whether the caller sent something the provider would never accept.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidAmount(_) | Self::InvalidSignature)
    }
}

/// Hex-encoded HMAC-SHA256 of `message` under `secret`.
pub(crate) fn hmac_sha256_hex(
    secret: &[u8],
    message: &[u8],
) -> Result<String, hmac::digest::InvalidLength> {
    let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(secret)?;
    mac.update(message);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time string comparison.
pub(crate) fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("hello", "hello"));
        assert!(constant_time_compare("", ""));
        assert!(!constant_time_compare("hello", "world"));
        assert!(!constant_time_compare("hello", "hello!"));
    }

    #[test]
    fn test_hmac_known_vector() {
        // RFC 4231 test case 2
        assert_eq!(
            hmac_sha256_hex(b"Jefe", b"what do ya want for nothing?").unwrap(),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_client_errors() {
        assert!(PaymentError::InvalidSignature.is_client_error());
        assert!(PaymentError::InvalidAmount("0".to_string()).is_client_error());
        assert!(!PaymentError::Api("down".to_string()).is_client_error());
    }
}
