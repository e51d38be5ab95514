//! Stripe webhook handler.
//!
//! The body is taken as raw bytes; verification needs them exactly as Stripe
//! sent them, so this route must not sit behind any body-transforming layer.

use axum::{Json, body::Bytes, extract::State, http::HeaderMap};
use serde::Serialize;
use tracing::instrument;

use crate::db::{OrderRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::payments::WebhookAction;
use crate::payments::stripe::SIGNATURE_HEADER;
use crate::state::AppState;

/// Acknowledgement body.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// Handle a Stripe event delivery.
///
/// Deliveries for unknown orders are acknowledged so Stripe stops retrying;
/// database failures return 500 so it tries again.
#[instrument(skip(state, headers, body), fields(body_len = body.len()))]
pub async fn stripe(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>> {
    let verifier = state
        .stripe()
        .ok_or_else(|| AppError::ServiceUnavailable("Stripe webhook not configured".to_string()))?;

    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    let event = verifier.construct_event(signature, &body).map_err(|e| {
        tracing::warn!(error = %e, "Stripe webhook rejected");
        AppError::from(e)
    })?;

    let orders = OrderRepository::new(state.pool());

    match event.action() {
        WebhookAction::MarkPaid {
            order_id,
            reference,
        } => match orders.mark_paid(order_id, &reference).await {
            Ok(order) => {
                tracing::info!(%order_id, event_type = %event.event_type, amount = %order.amount, "Order marked paid");
            }
            Err(RepositoryError::NotFound) => {
                tracing::warn!(%order_id, event_id = %event.id, "Webhook for unknown order");
            }
            Err(RepositoryError::Conflict(_)) => {
                tracing::warn!(%order_id, event_id = %event.id, "Payment reference already recorded on another order");
            }
            Err(e) => return Err(e.into()),
        },
        WebhookAction::DiscardUnpaid { order_id } => {
            if orders.delete_unpaid(order_id).await? {
                tracing::info!(%order_id, "Unpaid order discarded after failed payment");
            }
        }
        WebhookAction::Ignore => {
            tracing::debug!(event_type = %event.event_type, "Unhandled event type");
        }
    }

    Ok(Json(WebhookAck { received: true }))
}
