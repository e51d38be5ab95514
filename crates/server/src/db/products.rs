//! Product catalog repository.

use greencart_core::{Product, ProductId};
use rust_decimal::Decimal;
use sqlx::PgPool;

use super::RepositoryError;

const PRODUCT_COLUMNS: &str = "id, name, category, description, price, offer_price, in_stock";

/// Fields for inserting or refreshing a catalog entry.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: Vec<String>,
    pub price: Decimal,
    #[serde(default)]
    pub offer_price: Option<Decimal>,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
}

const fn default_in_stock() -> bool {
    true
}

/// Repository for catalog reads (and fixture upserts).
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List the whole catalog, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM greencart.products ORDER BY created_at, id"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Fetch the products with the given IDs. Unknown IDs are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let raw: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();

        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM greencart.products WHERE id = ANY($1)"
        ))
        .bind(raw)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Insert a product, or refresh the existing row with the same name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, Product>(&format!(
            r"
            INSERT INTO greencart.products (name, category, description, price, offer_price, in_stock)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (name) DO UPDATE
               SET category = EXCLUDED.category,
                   description = EXCLUDED.description,
                   price = EXCLUDED.price,
                   offer_price = EXCLUDED.offer_price,
                   in_stock = EXCLUDED.in_stock
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.offer_price)
        .bind(product.in_stock)
        .fetch_one(self.pool)
        .await?;

        Ok(row)
    }
}
