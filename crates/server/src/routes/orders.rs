//! Order route handlers.
//!
//! ```text
//! POST /api/order/cod              - Place a cash-on-delivery order
//! POST /api/order/razorpay-order   - Create a provider order to pay against
//! POST /api/order/razorpay-place   - Record a paid online order
//! GET  /api/order/user             - Caller's order history
//! ```

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use greencart_core::{
    AddressId, LineItem, ORDER_PLACED, Order, PaymentMethod, PaymentStatus, UserId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::db::{NewOrder, OrderRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::payments::ProviderOrder;
use crate::services::prepare_order;
use crate::state::AppState;

/// Message returned after an online order is recorded.
pub const PAYMENT_RECORDED: &str = "Payment Successful";

// =============================================================================
// Request / Response Types
// =============================================================================

/// Body of `POST /api/order/cod`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodOrderRequest {
    pub user_id: UserId,
    pub items: Vec<LineItem>,
    pub address: AddressId,
}

/// Body of `POST /api/order/razorpay-order`.
#[derive(Debug, Deserialize)]
pub struct ProviderOrderRequest {
    pub amount: Decimal,
}

/// Body of `POST /api/order/razorpay-place`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineOrderRequest {
    pub user_id: UserId,
    pub items: Vec<LineItem>,
    pub address: AddressId,
    pub payment_id: String,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
}

/// `{success, message}` acknowledgement.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}

/// Response body for `POST /api/order/razorpay-order`.
#[derive(Debug, Serialize)]
pub struct ProviderOrderResponse {
    pub success: bool,
    pub order: ProviderOrder,
    pub key: String,
}

/// Response body for `GET /api/order/user`.
#[derive(Debug, Serialize)]
pub struct OrderListResponse {
    pub success: bool,
    pub orders: Vec<Order>,
}

/// Unwrap a JSON body, mapping any decode failure to `Invalid data`.
fn body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload.map(|Json(value)| value).map_err(|rejection| {
        tracing::info!(error = %rejection, "Rejected order body");
        AppError::invalid_data()
    })
}

// =============================================================================
// Handlers
// =============================================================================

/// Place a cash-on-delivery order.
#[instrument(skip(state, payload))]
pub async fn place_cod(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CodOrderRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let request = body(payload)?;
    let priced = prepare_order(state.pool(), request.user_id, &request.items, request.address)
        .await?;

    let method = PaymentMethod::CashOnDelivery;
    let order = OrderRepository::new(state.pool())
        .create(&NewOrder {
            user_id: request.user_id,
            items: priced.items,
            amount: priced.amount,
            address_id: request.address,
            payment_method: method,
            payment_status: method.initial_status(),
            payment_reference: None,
        })
        .await?;

    tracing::info!(order_id = %order.id, amount = %order.amount, "COD order placed");

    Ok(Json(MessageResponse {
        success: true,
        message: ORDER_PLACED,
    }))
}

/// Create a Razorpay order for the amount the customer is about to pay.
#[instrument(skip(state, payload))]
pub async fn create_provider_order(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ProviderOrderRequest>, JsonRejection>,
) -> Result<Json<ProviderOrderResponse>> {
    let request = body(payload)?;
    let razorpay = state.razorpay();

    let order = razorpay.create_order(request.amount, None).await?;

    Ok(Json(ProviderOrderResponse {
        success: true,
        order,
        key: razorpay.key_id().to_string(),
    }))
}

/// Record an order the customer has paid for online.
///
/// Idempotent on `paymentId`: a repeated confirmation finalizes the existing
/// order instead of creating a second one.
#[instrument(skip(state, payload))]
pub async fn place_online(
    State(state): State<AppState>,
    payload: std::result::Result<Json<OnlineOrderRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let request = body(payload)?;
    let payment_id = request.payment_id.trim();
    if payment_id.is_empty() {
        return Err(AppError::invalid_data());
    }

    if let (Some(order_id), Some(signature)) = (&request.order_id, &request.signature) {
        state
            .razorpay()
            .verify_payment_signature(order_id, payment_id, signature)?;
    }

    let orders = OrderRepository::new(state.pool());

    if let Some(existing) = orders.find_by_payment_reference(payment_id).await? {
        return finalize_existing(&orders, &existing, request.user_id, payment_id).await;
    }

    let priced = prepare_order(state.pool(), request.user_id, &request.items, request.address)
        .await?;

    let created = orders
        .create(&NewOrder {
            user_id: request.user_id,
            items: priced.items,
            amount: priced.amount,
            address_id: request.address,
            payment_method: PaymentMethod::Online,
            payment_status: PaymentStatus::Paid,
            payment_reference: Some(payment_id.to_string()),
        })
        .await;

    match created {
        Ok(order) => {
            tracing::info!(order_id = %order.id, amount = %order.amount, "Online order recorded");
        }
        // Concurrent confirmation for the same payment won the insert
        Err(RepositoryError::Conflict(_)) => {
            let existing = orders
                .find_by_payment_reference(payment_id)
                .await?
                .ok_or_else(|| AppError::Internal("payment reference vanished".to_string()))?;
            return finalize_existing(&orders, &existing, request.user_id, payment_id).await;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(Json(MessageResponse {
        success: true,
        message: PAYMENT_RECORDED,
    }))
}

async fn finalize_existing(
    orders: &OrderRepository<'_>,
    existing: &Order,
    user_id: UserId,
    payment_id: &str,
) -> Result<Json<MessageResponse>> {
    if existing.user_id != user_id {
        tracing::warn!(order_id = %existing.id, "Payment reference belongs to another user");
        return Err(AppError::invalid_data());
    }

    if !existing.payment_status.is_paid() {
        orders.mark_paid(existing.id, payment_id).await?;
    }
    tracing::info!(order_id = %existing.id, "Online order finalized");

    Ok(Json(MessageResponse {
        success: true,
        message: PAYMENT_RECORDED,
    }))
}

/// The caller's order history, newest first.
#[instrument(skip(state), fields(user_id = %user_id))]
pub async fn list_for_user(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
) -> Result<Json<OrderListResponse>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_customer(user_id)
        .await?;

    Ok(Json(OrderListResponse {
        success: true,
        orders,
    }))
}
