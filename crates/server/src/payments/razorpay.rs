//! Razorpay REST client.
//!
//! Creates provider orders that the hosted checkout widget pays against, and
//! verifies the `razorpay_signature` the widget hands back on success.

use greencart_core::CurrencyCode;
use reqwest::Client;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::{PaymentError, constant_time_compare, hmac_sha256_hex};
use crate::config::RazorpayConfig;

/// A provider-side order, as returned by `POST /v1/orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderOrder {
    /// Provider order ID (`order_...`).
    pub id: String,
    /// Amount in the smallest currency unit.
    pub amount: i64,
    /// ISO currency code.
    pub currency: String,
}

#[derive(Serialize)]
struct CreateOrderRequest<'a> {
    amount: i64,
    currency: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    receipt: Option<&'a str>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// Razorpay API client.
#[derive(Clone)]
pub struct RazorpayClient {
    client: Client,
    key_id: String,
    key_secret: SecretString,
    api_base: String,
    currency: CurrencyCode,
}

impl std::fmt::Debug for RazorpayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RazorpayClient")
            .field("key_id", &self.key_id)
            .field("key_secret", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("currency", &self.currency)
            .finish_non_exhaustive()
    }
}

impl RazorpayClient {
    /// Create a client for the configured account and store currency.
    #[must_use]
    pub fn new(config: &RazorpayConfig, currency: CurrencyCode) -> Self {
        Self {
            client: Client::new(),
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
            api_base: config.api_base.as_str().trim_end_matches('/').to_string(),
            currency,
        }
    }

    /// Public key ID handed to the checkout widget.
    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Currency every order is created in.
    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    /// Create a provider order for `amount` (standard units).
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::InvalidAmount` if the amount is not positive or
    /// does not fit in minor units.
    /// Returns `PaymentError::Request`/`Response`/`Api` if the provider call fails.
    #[instrument(skip(self), fields(currency = %self.currency))]
    pub async fn create_order(
        &self,
        amount: Decimal,
        receipt: Option<&str>,
    ) -> Result<ProviderOrder, PaymentError> {
        let minor = self
            .currency
            .to_minor_units(amount)
            .filter(|units| *units > 0)
            .ok_or_else(|| PaymentError::InvalidAmount(amount.to_string()))?;

        let request = CreateOrderRequest {
            amount: minor,
            currency: self.currency.code(),
            receipt,
        };

        let response = self
            .client
            .post(format!("{}/v1/orders", self.api_base))
            .basic_auth(&self.key_id, Some(self.key_secret.expose_secret()))
            .json(&request)
            .send()
            .await
            .map_err(|e| PaymentError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .ok()
                .and_then(|env| env.error.description.or(env.error.code))
                .unwrap_or_else(|| format!("HTTP {status}"));
            error!(%status, error = %message, "Razorpay API error creating order");
            return Err(PaymentError::Api(message));
        }

        let order: ProviderOrder = response
            .json()
            .await
            .map_err(|e| PaymentError::Response(e.to_string()))?;

        debug!(order_id = %order.id, amount = order.amount, "Razorpay order created");

        Ok(order)
    }

    /// Verify the checkout signature over `"{order_id}|{payment_id}"`.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::InvalidSignature` if the signature does not match.
    #[instrument(skip(self, signature))]
    pub fn verify_payment_signature(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<(), PaymentError> {
        let payload = format!("{order_id}|{payment_id}");
        let expected = hmac_sha256_hex(
            self.key_secret.expose_secret().as_bytes(),
            payload.as_bytes(),
        )
        .map_err(|_| PaymentError::InvalidSignature)?;

        if !constant_time_compare(&expected, signature.trim()) {
            return Err(PaymentError::InvalidSignature);
        }

        debug!("Razorpay payment signature verified");

        Ok(())
    }
}
