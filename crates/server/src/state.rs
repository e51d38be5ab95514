//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::middleware::AllowedOrigins;
use crate::payments::{RazorpayClient, StripeVerifier};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and payment clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    razorpay: RazorpayClient,
    stripe: Option<StripeVerifier>,
    allowed_origins: AllowedOrigins,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration
    /// * `pool` - `PostgreSQL` connection pool
    #[must_use]
    pub fn new(config: ServerConfig, pool: PgPool) -> Self {
        let razorpay = RazorpayClient::new(&config.razorpay, config.currency);
        let stripe = config.stripe.as_ref().map(StripeVerifier::new);
        let allowed_origins = AllowedOrigins::new(&config.allowed_origins);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                razorpay,
                stripe,
                allowed_origins,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the Razorpay client.
    #[must_use]
    pub fn razorpay(&self) -> &RazorpayClient {
        &self.inner.razorpay
    }

    /// Get the Stripe webhook verifier, if a webhook secret is configured.
    #[must_use]
    pub fn stripe(&self) -> Option<&StripeVerifier> {
        self.inner.stripe.as_ref()
    }

    /// Get the CORS allow-list.
    #[must_use]
    pub fn allowed_origins(&self) -> &AllowedOrigins {
        &self.inner.allowed_origins
    }
}
