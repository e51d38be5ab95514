//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! gc-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string (must start with `postgres`)
//!
//! Migrations live in `crates/server/migrations/` and are embedded at build time.

use secrecy::SecretString;
use sqlx::migrate::MigrateError;
use thiserror::Error;
use tracing::info;

use greencart_server::config::{ConfigError, validate_database_url};
use greencart_server::db;

/// Errors from the migrate and seed commands.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] MigrateError),
}

/// Read and validate `DATABASE_URL`.
///
/// # Errors
///
/// Returns an error if the variable is missing or not a `PostgreSQL` URL.
pub fn database_url() -> Result<SecretString, MigrationError> {
    dotenvy::dotenv().ok();

    let url = std::env::var("DATABASE_URL")
        .map_err(|_| MigrationError::MissingEnvVar("DATABASE_URL"))?;
    validate_database_url("DATABASE_URL", &url)?;

    Ok(SecretString::from(url))
}

/// Run all pending migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let database_url = database_url()?;

    info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    info!("Running migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    info!("Migrations complete!");
    Ok(())
}
