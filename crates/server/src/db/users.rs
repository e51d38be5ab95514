//! User repository.
//!
//! Users are created by fixtures; request identity is asserted upstream and
//! only referenced here by ID.

use greencart_core::UserId;
use sqlx::PgPool;

use super::RepositoryError;

/// Repository for user rows.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a user or update the name of the user with the same email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(&self, name: &str, email: &str) -> Result<UserId, RepositoryError> {
        let id: UserId = sqlx::query_scalar(
            r"
            INSERT INTO greencart.users (name, email)
            VALUES ($1, $2)
            ON CONFLICT (email) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            ",
        )
        .bind(name)
        .bind(email.trim().to_lowercase())
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }
}
