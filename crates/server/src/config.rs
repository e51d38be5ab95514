//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string (`postgres://` or `postgresql://`)
//! - `RAZORPAY_KEY_ID` - Razorpay public key ID (handed to the payment widget)
//! - `RAZORPAY_KEY_SECRET` - Razorpay key secret (server-side only)
//!
//! ## Optional
//! - `GREENCART_HOST` - Bind address (default: 127.0.0.1)
//! - `GREENCART_PORT` - Listen port (default: 4000)
//! - `CORS_ALLOWED_ORIGINS` - Comma-separated origin allow-list (default: `http://localhost:5173`)
//! - `PAYMENT_CURRENCY` - ISO 4217 code for provider orders (default: INR)
//! - `RAZORPAY_API_BASE` - Razorpay REST base URL (default: `https://api.razorpay.com`)
//! - `STRIPE_WEBHOOK_SECRET` - Stripe endpoint signing secret; the webhook answers 503 without it
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use greencart_core::CurrencyCode;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:5173";
const DEFAULT_RAZORPAY_API_BASE: &str = "https://api.razorpay.com";

/// Default tolerance for Stripe signature timestamps.
pub const DEFAULT_WEBHOOK_TOLERANCE_SECS: i64 = 300;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Browser origins allowed to call the API with credentials
    pub allowed_origins: Vec<String>,
    /// Currency used for provider orders
    pub currency: CurrencyCode,
    /// Razorpay gateway configuration
    pub razorpay: RazorpayConfig,
    /// Stripe webhook configuration (webhook disabled when absent)
    pub stripe: Option<StripeConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// Razorpay gateway configuration.
///
/// Implements `Debug` manually to redact the key secret.
#[derive(Clone)]
pub struct RazorpayConfig {
    /// Public key ID, safe to expose to the browser widget
    pub key_id: String,
    /// Key secret used for API basic auth and signature checks
    pub key_secret: SecretString,
    /// REST API base URL
    pub api_base: Url,
}

impl std::fmt::Debug for RazorpayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RazorpayConfig")
            .field("key_id", &self.key_id)
            .field("key_secret", &"[REDACTED]")
            .field("api_base", &self.api_base.as_str())
            .finish()
    }
}

/// Stripe webhook configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Endpoint signing secret (`whsec_...`)
    pub webhook_secret: SecretString,
    /// Maximum accepted age of a signed timestamp, in seconds
    pub tolerance_secs: i64,
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("webhook_secret", &"[REDACTED]")
            .field("tolerance_secs", &self.tolerance_secs)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("DATABASE_URL")?;
        let host = get_env_or_default("GREENCART_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("GREENCART_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("GREENCART_PORT", "4000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("GREENCART_PORT".to_string(), e.to_string()))?;
        let allowed_origins = parse_origins(
            "CORS_ALLOWED_ORIGINS",
            &get_env_or_default("CORS_ALLOWED_ORIGINS", DEFAULT_ALLOWED_ORIGIN),
        )?;
        let currency = get_env_or_default("PAYMENT_CURRENCY", "INR")
            .parse::<CurrencyCode>()
            .map_err(|e| ConfigError::InvalidEnvVar("PAYMENT_CURRENCY".to_string(), e))?;

        Ok(Self {
            database_url,
            host,
            port,
            allowed_origins,
            currency,
            razorpay: RazorpayConfig::from_env()?,
            stripe: StripeConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl RazorpayConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api_base = get_env_or_default("RAZORPAY_API_BASE", DEFAULT_RAZORPAY_API_BASE);
        let api_base = Url::parse(&api_base).map_err(|e| {
            ConfigError::InvalidEnvVar("RAZORPAY_API_BASE".to_string(), e.to_string())
        })?;

        Ok(Self {
            key_id: get_required_env("RAZORPAY_KEY_ID")?,
            key_secret: get_validated_secret("RAZORPAY_KEY_SECRET")?,
            api_base,
        })
    }
}

impl StripeConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        if get_optional_env("STRIPE_WEBHOOK_SECRET").is_none() {
            return Ok(None);
        }

        Ok(Some(Self {
            webhook_secret: get_validated_secret("STRIPE_WEBHOOK_SECRET")?,
            tolerance_secs: DEFAULT_WEBHOOK_TOLERANCE_SECS,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get the database URL and check it points at `PostgreSQL`.
fn get_database_url(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_database_url(key, &value)?;
    Ok(SecretString::from(value.trim().to_string()))
}

/// Reject connection strings for anything other than `PostgreSQL`.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` naming `key` when the scheme is wrong.
pub fn validate_database_url(key: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().starts_with("postgres") {
        Ok(())
    } else {
        Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be a postgres:// or postgresql:// URL".to_string(),
        ))
    }
}

/// Parse a comma-separated origin list into normalized `scheme://host[:port]` strings.
fn parse_origins(key: &str, raw: &str) -> Result<Vec<String>, ConfigError> {
    let mut origins = Vec::new();

    for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let url = Url::parse(entry)
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), format!("{entry}: {e}")))?;

        let origin = url.origin();
        if !origin.is_tuple() {
            return Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("{entry}: not an http(s) origin"),
            ));
        }

        let origin = origin.ascii_serialization();
        if !origins.contains(&origin) {
            origins.push(origin);
        }
    }

    if origins.is_empty() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "at least one origin is required".to_string(),
        ));
    }

    Ok(origins)
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the value issued by the provider."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_database_url_must_be_postgres() {
        assert!(validate_database_url("DATABASE_URL", "postgres://localhost/greencart").is_ok());
        assert!(validate_database_url("DATABASE_URL", "postgresql://u:p@db/gc").is_ok());

        let err = validate_database_url("DATABASE_URL", "mongodb://localhost").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "DATABASE_URL"));
        assert!(validate_database_url("DATABASE_URL", "").is_err());
    }

    #[test]
    fn test_parse_origins_normalizes_and_dedupes() {
        let origins = parse_origins(
            "CORS",
            "http://localhost:5173/, https://shop.example.app , http://localhost:5173",
        )
        .unwrap();
        assert_eq!(
            origins,
            vec![
                "http://localhost:5173".to_string(),
                "https://shop.example.app".to_string()
            ]
        );
    }

    #[test]
    fn test_parse_origins_rejects_garbage() {
        assert!(parse_origins("CORS", "not a url").is_err());
        assert!(parse_origins("CORS", " , ").is_err());
        assert!(parse_origins("CORS", "data:text/plain,hi").is_err());
    }

    #[test]
    fn test_shannon_entropy() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy("aB3$xY9!mK2@nL5#") > 3.3);
    }

    #[test]
    fn test_validate_secret_strength() {
        assert!(matches!(
            validate_secret_strength("your-razorpay-secret", "RAZORPAY_KEY_SECRET"),
            Err(ConfigError::InsecureSecret(_, _))
        ));
        assert!(validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaa", "RAZORPAY_KEY_SECRET").is_err());
        assert!(validate_secret_strength("whsec_9fQ2xLk7PzR4mT8vB1nC6yH3", "STRIPE").is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 4000,
            allowed_origins: vec![DEFAULT_ALLOWED_ORIGIN.to_string()],
            currency: CurrencyCode::INR,
            razorpay: RazorpayConfig {
                key_id: "rzp_test_key".to_string(),
                key_secret: SecretString::from("s3cr3t"),
                api_base: Url::parse(DEFAULT_RAZORPAY_API_BASE).unwrap(),
            },
            stripe: None,
            sentry_dsn: None,
            sentry_environment: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 4000);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let razorpay = RazorpayConfig {
            key_id: "rzp_test_visible".to_string(),
            key_secret: SecretString::from("super_hidden_key_secret"),
            api_base: Url::parse(DEFAULT_RAZORPAY_API_BASE).unwrap(),
        };
        let stripe = StripeConfig {
            webhook_secret: SecretString::from("whsec_super_hidden"),
            tolerance_secs: DEFAULT_WEBHOOK_TOLERANCE_SECS,
        };

        let debug_output = format!("{razorpay:?} {stripe:?}");
        assert!(debug_output.contains("rzp_test_visible"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_hidden"));
    }
}
