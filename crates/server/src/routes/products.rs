//! Catalog route handlers.

use axum::{Json, extract::State};
use greencart_core::Product;
use serde::Serialize;
use tracing::instrument;

use crate::db::ProductRepository;
use crate::error::Result;
use crate::state::AppState;

/// Response body for `GET /api/product/list`.
#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub success: bool,
    pub products: Vec<Product>,
}

/// List the whole catalog.
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Json<ProductListResponse>> {
    let products = ProductRepository::new(state.pool()).list().await?;

    Ok(Json(ProductListResponse {
        success: true,
        products,
    }))
}
