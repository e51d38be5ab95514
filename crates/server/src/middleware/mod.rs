//! HTTP middleware stack for the GreenCart API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction capture)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Origin rejection (403 for unlisted `Origin`)
//! 5. CORS (preflight handling and response headers)
//!
//! The Stripe webhook route sits on the outer router and receives the raw body.

pub mod cors;
pub mod identity;
pub mod request_id;

pub use cors::{AllowedOrigins, cors_layer, reject_unlisted_origin};
pub use identity::{RequireUser, USER_ID_HEADER};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
