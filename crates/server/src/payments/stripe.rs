//! Stripe webhook verification.
//!
//! Stripe signs each delivery with a `Stripe-Signature` header of the form
//! `t=<unix seconds>,v1=<hex hmac>[,v1=...]`. The HMAC-SHA256 is computed over
//! `"{t}.{raw body}"`, so verification must see the body bytes exactly as sent.

use greencart_core::OrderId;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use super::{constant_time_compare, hmac_sha256_hex};
use crate::config::StripeConfig;

/// Name of the signature header.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Webhook verification and parsing errors.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// No `Stripe-Signature` header on the request.
    #[error("missing signature header")]
    MissingSignature,

    /// Header present but missing `t=` or `v1=`.
    #[error("malformed signature header")]
    MalformedHeader,

    /// Timestamp outside the tolerance window.
    #[error("timestamp outside the tolerance zone")]
    TimestampOutOfTolerance,

    /// No `v1` signature matched.
    #[error("no signatures found matching the expected signature for payload")]
    SignatureMismatch,

    /// Body is not a valid event.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

/// A verified Stripe event. Only the fields the store reacts to are decoded.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeEvent {
    /// Event ID (`evt_...`).
    pub id: String,
    /// Event type, e.g. `payment_intent.succeeded`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event payload.
    pub data: EventData,
}

/// Wrapper around the event's object.
#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    /// The payment intent or checkout session the event is about.
    pub object: serde_json::Value,
}

/// What the store should do in response to an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookAction {
    /// Mark the order paid with the given payment reference.
    MarkPaid {
        order_id: OrderId,
        reference: String,
    },
    /// Remove the order if it was never paid.
    DiscardUnpaid { order_id: OrderId },
    /// Acknowledge and do nothing.
    Ignore,
}

impl StripeEvent {
    /// Order ID carried in the object's `metadata.orderId`, if any.
    fn order_id(&self) -> Option<OrderId> {
        let raw = self.data.object.get("metadata")?.get("orderId")?;
        match raw {
            serde_json::Value::String(s) => s.parse().ok(),
            serde_json::Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()).map(OrderId::new),
            _ => None,
        }
    }

    fn object_str(&self, key: &str) -> Option<&str> {
        self.data.object.get(key).and_then(serde_json::Value::as_str)
    }

    /// Decide how to react to this event.
    #[must_use]
    pub fn action(&self) -> WebhookAction {
        let Some(order_id) = self.order_id() else {
            return WebhookAction::Ignore;
        };

        match self.event_type.as_str() {
            "payment_intent.succeeded" => match self.object_str("id") {
                Some(intent) => WebhookAction::MarkPaid {
                    order_id,
                    reference: intent.to_string(),
                },
                None => WebhookAction::Ignore,
            },
            "checkout.session.completed" => {
                match self.object_str("payment_intent").or_else(|| self.object_str("id")) {
                    Some(reference) => WebhookAction::MarkPaid {
                        order_id,
                        reference: reference.to_string(),
                    },
                    None => WebhookAction::Ignore,
                }
            }
            "payment_intent.payment_failed" => WebhookAction::DiscardUnpaid { order_id },
            _ => WebhookAction::Ignore,
        }
    }
}

/// Verifies `Stripe-Signature` headers against the endpoint secret.
#[derive(Clone)]
pub struct StripeVerifier {
    secret: SecretString,
    tolerance_secs: i64,
}

impl std::fmt::Debug for StripeVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeVerifier")
            .field("secret", &"[REDACTED]")
            .field("tolerance_secs", &self.tolerance_secs)
            .finish()
    }
}

impl StripeVerifier {
    /// Create a verifier from configuration.
    #[must_use]
    pub fn new(config: &StripeConfig) -> Self {
        Self {
            secret: config.webhook_secret.clone(),
            tolerance_secs: config.tolerance_secs,
        }
    }

    /// Verify a delivery and decode its event.
    ///
    /// # Errors
    ///
    /// Returns a `WebhookError` if the header is missing or malformed, the
    /// timestamp is stale, no signature matches, or the body is not an event.
    #[instrument(skip_all)]
    pub fn construct_event(
        &self,
        header: Option<&str>,
        payload: &[u8],
    ) -> Result<StripeEvent, WebhookError> {
        let header = header.ok_or(WebhookError::MissingSignature)?;
        self.verify_at(header, payload, chrono::Utc::now().timestamp())?;

        let event: StripeEvent = serde_json::from_slice(payload)
            .map_err(|e| WebhookError::InvalidPayload(e.to_string()))?;

        debug!(event_id = %event.id, event_type = %event.event_type, "Stripe event verified");

        Ok(event)
    }

    /// Verify a signature header as of `now` (unix seconds).
    ///
    /// # Errors
    ///
    /// Returns a `WebhookError` describing the first check that failed.
    pub fn verify_at(&self, header: &str, payload: &[u8], now: i64) -> Result<(), WebhookError> {
        let (timestamp, signatures) = parse_header(header)?;

        if (now - timestamp).abs() > self.tolerance_secs {
            return Err(WebhookError::TimestampOutOfTolerance);
        }

        let mut signed = Vec::with_capacity(payload.len() + 12);
        signed.extend_from_slice(timestamp.to_string().as_bytes());
        signed.push(b'.');
        signed.extend_from_slice(payload);

        let expected = hmac_sha256_hex(self.secret.expose_secret().as_bytes(), &signed)
            .map_err(|_| WebhookError::SignatureMismatch)?;

        if signatures
            .iter()
            .any(|candidate| constant_time_compare(&expected, candidate))
        {
            Ok(())
        } else {
            Err(WebhookError::SignatureMismatch)
        }
    }
}

/// Split a signature header into its timestamp and `v1` signatures.
fn parse_header(header: &str) -> Result<(i64, Vec<&str>), WebhookError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => {
                timestamp = Some(
                    value
                        .parse::<i64>()
                        .map_err(|_| WebhookError::MalformedHeader)?,
                );
            }
            "v1" => signatures.push(value),
            _ => {}
        }
    }

    match timestamp {
        Some(ts) if !signatures.is_empty() => Ok((ts, signatures)),
        _ => Err(WebhookError::MalformedHeader),
    }
}

/// Build a signature header for `payload` (used by tests and local tooling).
///
/// # Errors
///
/// Returns `WebhookError::SignatureMismatch` if the secret cannot key an HMAC.
pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> Result<String, WebhookError> {
    let mut signed = format!("{timestamp}.").into_bytes();
    signed.extend_from_slice(payload);
    let signature =
        hmac_sha256_hex(secret.as_bytes(), &signed).map_err(|_| WebhookError::SignatureMismatch)?;
    Ok(format!("t={timestamp},v1={signature}"))
}
