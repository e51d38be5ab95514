//! Integration tests for the server router: middleware, request validation,
//! the Razorpay order proxy and the Stripe webhook.
//!
//! Requests are driven through `tower::ServiceExt::oneshot`; every path tested
//! here answers before touching the database.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    body::{Body, to_bytes},
    extract::State,
    http::{HeaderMap, Method, Request, StatusCode, header},
    response::Response,
    routing::post,
};
use greencart_integration_tests::{
    ALLOWED_ORIGIN, RAZORPAY_KEY_ID, STRIPE_SECRET, base_url, spawn, test_app, test_config,
};
use greencart_server::payments::stripe::sign_payload;
use serde_json::{Value, json};
use tower::ServiceExt;
use url::Url;

fn unused_provider() -> Url {
    Url::parse("http://127.0.0.1:9/").unwrap()
}

fn app() -> Router {
    test_app(test_config(unused_provider(), false))
}

fn app_with_webhook() -> Router {
    test_app(test_config(unused_provider(), true))
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// ============================================================================
// Health & Middleware
// ============================================================================

#[tokio::test]
async fn test_health_and_banner() {
    let response = app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app()
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("GreenCart"));
}

#[tokio::test]
async fn test_request_id_generated_and_echoed() {
    let response = app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.headers().contains_key("x-request-id"));

    let response = app()
        .oneshot(
            Request::get("/health")
                .header("x-request-id", "upstream-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "upstream-42");
}

#[tokio::test]
async fn test_unlisted_origin_rejected() {
    let response = app()
        .oneshot(
            Request::get("/health")
                .header(header::ORIGIN, "https://evil.example.net")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_listed_origin_gets_credentialed_cors_headers() {
    let response = app()
        .oneshot(
            Request::get("/health")
                .header(header::ORIGIN, ALLOWED_ORIGIN)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        ALLOWED_ORIGIN
    );
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
        "true"
    );
}

#[tokio::test]
async fn test_preflight_from_listed_origin() {
    let response = app()
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/order/cod")
                .header(header::ORIGIN, ALLOWED_ORIGIN)
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_success());
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        ALLOWED_ORIGIN
    );
    let methods = response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS]
        .to_str()
        .unwrap()
        .to_string();
    assert!(methods.contains("POST"));
    assert!(methods.contains("DELETE"));
}

#[tokio::test]
async fn test_preflight_from_unlisted_origin_rejected() {
    let response = app()
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/order/cod")
                .header(header::ORIGIN, "http://localhost:3000")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ============================================================================
// Identity & Validation
// ============================================================================

#[tokio::test]
async fn test_address_list_requires_user_header() {
    let response = app()
        .oneshot(Request::get("/api/address/get").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["success"], false);
}

#[tokio::test]
async fn test_order_history_rejects_malformed_user_header() {
    let response = app()
        .oneshot(
            Request::get("/api/order/user")
                .header("x-user-id", "not-a-number")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cod_rejects_empty_items() {
    let response = app()
        .oneshot(post_json(
            "/api/order/cod",
            &json!({ "userId": 1, "items": [], "address": 2 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body, json!({ "success": false, "message": "Invalid data" }));
}

#[tokio::test]
async fn test_cod_rejects_malformed_body() {
    let response = app()
        .oneshot(post_json("/api/order/cod", &json!({ "items": "lots" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["message"], "Invalid data");
}

#[tokio::test]
async fn test_online_place_rejects_bad_signature() {
    let response = app()
        .oneshot(post_json(
            "/api/order/razorpay-place",
            &json!({
                "userId": 1,
                "items": [{ "product": 1, "quantity": 1 }],
                "address": 2,
                "paymentId": "pay_X",
                "orderId": "order_X",
                "signature": "0000"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["success"], false);
}

#[tokio::test]
async fn test_online_place_requires_payment_id() {
    let response = app()
        .oneshot(post_json(
            "/api/order/razorpay-place",
            &json!({
                "userId": 1,
                "items": [{ "product": 1, "quantity": 1 }],
                "address": 2,
                "paymentId": "  "
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Razorpay Order Proxy
// ============================================================================

#[derive(Clone, Default)]
struct ProviderLog {
    requests: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

async fn stub_create_order(
    State(log): State<ProviderLog>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    log.requests.lock().unwrap().push((auth, body.clone()));

    Json(json!({
        "id": "order_Stub123",
        "entity": "order",
        "amount": body["amount"],
        "currency": body["currency"],
        "status": "created"
    }))
}

async fn spawn_provider() -> (Url, ProviderLog) {
    let log = ProviderLog::default();
    let router = Router::new()
        .route("/v1/orders", post(stub_create_order))
        .with_state(log.clone());
    (base_url(spawn(router).await), log)
}

#[tokio::test]
async fn test_provider_order_converted_to_paise() {
    let (provider, log) = spawn_provider().await;
    let app = test_app(test_config(provider, false));

    let response = app
        .oneshot(post_json("/api/order/razorpay-order", &json!({ "amount": 25.5 })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["order"]["id"], "order_Stub123");
    assert_eq!(body["order"]["amount"], 2550);
    assert_eq!(body["order"]["currency"], "INR");
    assert_eq!(body["key"], RAZORPAY_KEY_ID);

    let requests = log.requests.lock().unwrap();
    let (auth, sent) = &requests[0];
    assert!(auth.as_deref().unwrap().starts_with("Basic "));
    assert_eq!(sent["amount"], 2550);
    assert_eq!(sent["currency"], "INR");
}

#[tokio::test]
async fn test_provider_order_rejects_non_positive_amount() {
    let (provider, log) = spawn_provider().await;
    let app = test_app(test_config(provider, false));

    let response = app
        .oneshot(post_json("/api/order/razorpay-order", &json!({ "amount": 0 })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(log.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_provider_order_rejects_overflowing_amount() {
    let (provider, log) = spawn_provider().await;
    let app = test_app(test_config(provider, false));

    let response = app
        .oneshot(post_json(
            "/api/order/razorpay-order",
            &json!({ "amount": "79228162514264337593543950335" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["success"], false);
    assert!(log.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_provider_failure_is_bad_gateway() {
    let router = Router::new().route(
        "/v1/orders",
        post(|| async {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": { "code": "BAD_REQUEST_ERROR", "description": "Authentication failed" } })),
            )
        }),
    );
    let provider = base_url(spawn(router).await);
    let app = test_app(test_config(provider, false));

    let response = app
        .oneshot(post_json("/api/order/razorpay-order", &json!({ "amount": "10" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(json_body(response).await["message"], "Payment provider error");
}

// ============================================================================
// Stripe Webhook
// ============================================================================

fn webhook_request(signature: Option<&str>, payload: &[u8]) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/stripe")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(signature) = signature {
        builder = builder.header("stripe-signature", signature);
    }
    builder.body(Body::from(payload.to_vec())).unwrap()
}

fn unrelated_event() -> Vec<u8> {
    // Deliberately unusual spacing: verification must see the exact bytes
    br#"{"id":"evt_1",  "type":"customer.created", "data":{"object":{"id":"cus_1"}}}"#.to_vec()
}

#[tokio::test]
async fn test_webhook_unconfigured_is_unavailable() {
    let payload = unrelated_event();
    let signature = sign_payload(STRIPE_SECRET, chrono::Utc::now().timestamp(), &payload).unwrap();

    let response = app()
        .oneshot(webhook_request(Some(&signature), &payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_webhook_acknowledges_verified_event() {
    let payload = unrelated_event();
    let signature = sign_payload(STRIPE_SECRET, chrono::Utc::now().timestamp(), &payload).unwrap();

    let response = app_with_webhook()
        .oneshot(webhook_request(Some(&signature), &payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "received": true }));
}

#[tokio::test]
async fn test_webhook_rejects_missing_or_bad_signature() {
    let payload = unrelated_event();

    let response = app_with_webhook()
        .oneshot(webhook_request(None, &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let wrong = sign_payload("whsec_wrong", chrono::Utc::now().timestamp(), &payload).unwrap();
    let response = app_with_webhook()
        .oneshot(webhook_request(Some(&wrong), &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_webhook_rejects_reserialized_body() {
    let payload = unrelated_event();
    let signature = sign_payload(STRIPE_SECRET, chrono::Utc::now().timestamp(), &payload).unwrap();

    let reserialized: Value = serde_json::from_slice(&payload).unwrap();
    let response = app_with_webhook()
        .oneshot(webhook_request(
            Some(&signature),
            reserialized.to_string().as_bytes(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_webhook_rejects_stale_timestamp() {
    let payload = unrelated_event();
    let stale = chrono::Utc::now().timestamp() - 3600;
    let signature = sign_payload(STRIPE_SECRET, stale, &payload).unwrap();

    let response = app_with_webhook()
        .oneshot(webhook_request(Some(&signature), &payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_webhook_not_bound_by_api_body_limit() {
    let padding = "x".repeat(200 * 1024);
    let payload = format!(
        r#"{{"id":"evt_big","type":"invoice.created","data":{{"object":{{"id":"in_1","memo":"{padding}"}}}}}}"#
    )
    .into_bytes();
    let signature = sign_payload(STRIPE_SECRET, chrono::Utc::now().timestamp(), &payload).unwrap();

    let response = app_with_webhook()
        .oneshot(webhook_request(Some(&signature), &payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_api_routes_enforce_body_limit() {
    let padding = "x".repeat(200 * 1024);
    let response = app()
        .oneshot(post_json(
            "/api/order/cod",
            &json!({ "userId": 1, "items": [], "address": 1, "note": padding }),
        ))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}
