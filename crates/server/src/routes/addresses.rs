//! Address route handlers.

use axum::{Json, extract::State};
use greencart_core::Address;
use serde::Serialize;
use tracing::instrument;

use crate::db::AddressRepository;
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::state::AppState;

/// Response body for `GET /api/address/get`.
#[derive(Debug, Serialize)]
pub struct AddressListResponse {
    pub success: bool,
    pub addresses: Vec<Address>,
}

/// The caller's delivery addresses, oldest first.
#[instrument(skip(state), fields(user_id = %user_id))]
pub async fn list(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
) -> Result<Json<AddressListResponse>> {
    let addresses = AddressRepository::new(state.pool())
        .list_for_user(user_id)
        .await?;

    Ok(Json(AddressListResponse {
        success: true,
        addresses,
    }))
}
