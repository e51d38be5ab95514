//! Delivery address repository.

use greencart_core::{Address, AddressId, UserId};
use sqlx::PgPool;

use super::RepositoryError;

const ADDRESS_COLUMNS: &str =
    "id, user_id, first_name, last_name, email, street, city, state, zipcode, country, phone";

/// Fields for inserting an address (fixtures only; there is no HTTP write path).
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAddress {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
    pub country: String,
    pub phone: String,
}

/// Repository for address reads (and fixture upserts).
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All addresses owned by a user, in creation order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let addresses = sqlx::query_as::<_, Address>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM greencart.addresses WHERE user_id = $1 ORDER BY created_at, id"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(addresses)
    }

    /// Fetch an address only if it belongs to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        id: AddressId,
        user_id: UserId,
    ) -> Result<Option<Address>, RepositoryError> {
        let address = sqlx::query_as::<_, Address>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM greencart.addresses WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(address)
    }

    /// Insert an address for a user, or refresh the one with the same street
    /// and zipcode. A refreshed row keeps its ID and creation time.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails (e.g., unknown user).
    pub async fn upsert(
        &self,
        user_id: UserId,
        address: &NewAddress,
    ) -> Result<Address, RepositoryError> {
        let row = sqlx::query_as::<_, Address>(&format!(
            r"
            INSERT INTO greencart.addresses
                (user_id, first_name, last_name, email, street, city, state, zipcode, country, phone)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (user_id, street, zipcode) DO UPDATE
               SET first_name = EXCLUDED.first_name,
                   last_name = EXCLUDED.last_name,
                   email = EXCLUDED.email,
                   city = EXCLUDED.city,
                   state = EXCLUDED.state,
                   country = EXCLUDED.country,
                   phone = EXCLUDED.phone
            RETURNING {ADDRESS_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(&address.first_name)
        .bind(&address.last_name)
        .bind(&address.email)
        .bind(&address.street)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.zipcode)
        .bind(&address.country)
        .bind(&address.phone)
        .fetch_one(self.pool)
        .await?;

        Ok(row)
    }
}
