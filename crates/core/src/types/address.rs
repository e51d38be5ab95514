//! Delivery address.

use serde::{Deserialize, Serialize};

use super::id::{AddressId, UserId};

/// A postal address owned by a user account, referenced by ID at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
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

impl Address {
    /// One-line label shown in the address picker.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}, {}", self.street, self.city)
    }
}
