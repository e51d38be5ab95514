//! HTTP route handlers for the GreenCart API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Liveness banner
//! GET  /health                    - Health check
//! GET  /health/ready              - Readiness (database)
//!
//! # Catalog
//! GET  /api/product/list          - Product catalog
//!
//! # Addresses (requires X-User-Id)
//! GET  /api/address/get           - Caller's addresses
//!
//! # Orders
//! POST /api/order/cod             - Place COD order
//! POST /api/order/razorpay-order  - Create provider order
//! POST /api/order/razorpay-place  - Record paid online order
//! GET  /api/order/user            - Caller's orders (requires X-User-Id)
//!
//! # Webhooks (raw body)
//! POST /stripe                    - Stripe events
//! ```

pub mod addresses;
pub mod health;
pub mod orders;
pub mod products;
pub mod webhook;

use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{Request, Response},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::{cors_layer, reject_unlisted_origin, request_id_middleware};
use crate::state::AppState;

/// Maximum JSON body accepted by the API routes.
const API_BODY_LIMIT: usize = 64 * 1024;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new().route("/list", get(products::list))
}

/// Create the address routes router.
pub fn address_routes() -> Router<AppState> {
    Router::new().route("/get", get(addresses::list))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/cod", post(orders::place_cod))
        .route("/razorpay-order", post(orders::create_provider_order))
        .route("/razorpay-place", post(orders::place_online))
        .route("/user", get(orders::list_for_user))
}

/// Create the JSON API routes, with their body limit applied.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health::banner))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api/product", product_routes())
        .nest("/api/address", address_routes())
        .nest("/api/order", order_routes())
        .layer(DefaultBodyLimit::max(API_BODY_LIMIT))
}

/// Build the complete application: webhook, API routes and middleware.
pub fn app(state: AppState) -> Router {
    let origins = state.allowed_origins().clone();

    Router::new()
        // Raw-body webhook, merged ahead of the API routes and their body layers
        .route("/stripe", post(webhook::stripe))
        .merge(routes())
        .with_state(state)
        .layer(cors_layer(&origins))
        .layer(from_fn_with_state(origins, reject_unlisted_origin))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(|response: &Response<_>, latency: Duration, span: &Span| {
                    span.record("status", response.status().as_u16());
                    span.record(
                        "latency_ms",
                        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    );
                    DefaultOnResponse::default().on_response(response, latency, span);
                }),
        )
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
