//! Order pricing and validation.
//!
//! Clients send product IDs and quantities only; the charged amount is always
//! recomputed here from catalog prices plus the fixed surcharge.

use std::collections::BTreeMap;

use greencart_core::{AddressId, LineItem, Product, ProductId, UserId, checkout_total};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use crate::db::{AddressRepository, ProductRepository};
use crate::error::{AppError, Result};

/// Line items that passed validation, with the amount to charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedOrder {
    /// Merged line items, ordered by product ID.
    pub items: Vec<LineItem>,
    /// Subtotal plus surcharge, rounded to two decimals.
    pub amount: Decimal,
}

/// Why a set of line items was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    #[error("order has no items")]
    Empty,
    #[error("zero quantity for product {0}")]
    ZeroQuantity(ProductId),
    #[error("unknown product {0}")]
    UnknownProduct(ProductId),
}

/// Merge duplicate lines and price them against `catalog`.
///
/// # Errors
///
/// Returns a `PricingError` if there are no items, a quantity is zero, or a
/// product is not in the catalog.
pub fn price_items(
    items: &[LineItem],
    catalog: &[Product],
) -> std::result::Result<PricedOrder, PricingError> {
    if items.is_empty() {
        return Err(PricingError::Empty);
    }

    let mut merged: BTreeMap<ProductId, u32> = BTreeMap::new();
    for item in items {
        if item.quantity == 0 {
            return Err(PricingError::ZeroQuantity(item.product_id));
        }
        let entry = merged.entry(item.product_id).or_default();
        *entry = entry.saturating_add(item.quantity);
    }

    let mut subtotal = Decimal::ZERO;
    for (&product_id, &quantity) in &merged {
        let product = catalog
            .iter()
            .find(|p| p.id == product_id)
            .ok_or(PricingError::UnknownProduct(product_id))?;
        subtotal += product.line_total(quantity);
    }

    Ok(PricedOrder {
        items: merged
            .into_iter()
            .map(|(product_id, quantity)| LineItem::new(product_id, quantity))
            .collect(),
        amount: checkout_total(subtotal),
    })
}

/// Validate an order request against the database and price it.
///
/// Any failure the client could have caused maps to the generic
/// `Invalid data` response.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for invalid items or an address the user
/// does not own, and `AppError::Database` if a query fails.
#[instrument(skip(pool, items), fields(item_count = items.len()))]
pub async fn prepare_order(
    pool: &PgPool,
    user_id: UserId,
    items: &[LineItem],
    address_id: AddressId,
) -> Result<PricedOrder> {
    if items.is_empty() {
        return Err(AppError::invalid_data());
    }

    let ids: Vec<ProductId> = items.iter().map(|item| item.product_id).collect();
    let catalog = ProductRepository::new(pool).get_many(&ids).await?;

    let priced = price_items(items, &catalog).map_err(|e| {
        tracing::info!(error = %e, "Rejected order items");
        AppError::invalid_data()
    })?;

    AddressRepository::new(pool)
        .get_for_user(address_id, user_id)
        .await?
        .ok_or_else(|| {
            tracing::info!(%address_id, "Address not owned by user");
            AppError::invalid_data()
        })?;

    Ok(priced)
}
