//! Cross-origin policy.
//!
//! Two pieces work together: [`cors_layer`] answers preflights and decorates
//! responses for allow-listed origins, and [`reject_unlisted_origin`] refuses
//! any request whose `Origin` is not on the list with a 403. Requests with no
//! `Origin` (curl, server-to-server, payment webhooks) pass through.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{
        HeaderName, HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE, ORIGIN},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::error::AppError;
use crate::middleware::identity::USER_ID_HEADER;

/// Normalized origins allowed to call the API.
#[derive(Debug, Clone)]
pub struct AllowedOrigins(Arc<[String]>);

impl AllowedOrigins {
    /// Wrap a list of normalized origins (`scheme://host[:port]`).
    #[must_use]
    pub fn new(origins: &[String]) -> Self {
        Self(origins.iter().cloned().collect())
    }

    /// Whether `origin` is on the list.
    #[must_use]
    pub fn contains(&self, origin: &str) -> bool {
        let origin = origin.trim_end_matches('/');
        self.0.iter().any(|allowed| allowed == origin)
    }

    fn header_values(&self) -> Vec<HeaderValue> {
        self.0
            .iter()
            .filter_map(|origin| HeaderValue::from_str(origin).ok())
            .collect()
    }
}

/// Build the CORS layer for the allow-list.
#[must_use]
pub fn cors_layer(origins: &AllowedOrigins) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins.header_values()))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static(USER_ID_HEADER),
        ])
}

/// Middleware that rejects requests from origins not on the allow-list.
pub async fn reject_unlisted_origin(
    State(origins): State<AllowedOrigins>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(origin) = request.headers().get(ORIGIN) {
        let allowed = origin.to_str().is_ok_and(|o| origins.contains(o));
        if !allowed {
            tracing::warn!(origin = ?origin, "Rejected request from unlisted origin");
            return AppError::Forbidden("This origin is not allowed".to_string()).into_response();
        }
    }

    next.run(request).await
}
