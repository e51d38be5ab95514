//! Caller identity extractor.
//!
//! Authentication happens upstream; the authenticated user's ID arrives in the
//! `X-User-Id` header. Handlers that act on behalf of a user take
//! [`RequireUser`] and never see requests without it.

use axum::{extract::FromRequestParts, http::request::Parts};
use greencart_core::UserId;

use crate::error::{AppError, set_sentry_user};

/// Header carrying the authenticated user's ID.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Extractor that requires a caller identity.
///
/// # Example
///
/// ```rust,ignore
/// async fn my_orders(RequireUser(user_id): RequireUser) -> impl IntoResponse {
///     format!("orders for {user_id}")
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RequireUser(pub UserId);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| AppError::Unauthorized("Not Authorized".to_string()))?;

        let user_id = raw
            .to_str()
            .ok()
            .and_then(|s| s.parse::<UserId>().ok())
            .ok_or_else(|| AppError::Unauthorized("Invalid user identity".to_string()))?;

        set_sentry_user(&user_id);
        tracing::Span::current().record("user_id", user_id.as_i32());

        Ok(Self(user_id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};
    use axum::response::IntoResponse;

    async fn extract(header: Option<&str>) -> Result<RequireUser, AppError> {
        let mut builder = Request::builder().uri("/api/order/user");
        if let Some(value) = header {
            builder = builder.header(USER_ID_HEADER, value);
        }
        let (mut parts, ()) = builder.body(()).unwrap().into_parts();
        RequireUser::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_header_parsed() {
        let RequireUser(user_id) = extract(Some(" 17 ")).await.unwrap();
        assert_eq!(user_id, UserId::new(17));
    }

    #[tokio::test]
    async fn test_missing_header_unauthorized() {
        let err = extract(None).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_garbage_header_unauthorized() {
        let err = extract(Some("alice")).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }
}
