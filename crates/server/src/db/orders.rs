//! Order repository.
//!
//! Line items are stored as a JSONB document on the order row. Payment method
//! and status are stored as text and parsed back on read.

use chrono::{DateTime, Utc};
use greencart_core::{
    AddressId, LineItem, ORDER_PLACED, Order, OrderId, PaymentMethod, PaymentStatus, UserId,
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;

use super::RepositoryError;

const ORDER_COLUMNS: &str = "id, user_id, items, amount, address_id, payment_method, \
                             payment_status, payment_reference, status, created_at, updated_at";

/// Row shape of `greencart.orders`.
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    items: Json<Vec<LineItem>>,
    amount: Decimal,
    address_id: AddressId,
    payment_method: String,
    payment_status: String,
    payment_reference: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let payment_method = row.payment_method.parse::<PaymentMethod>().map_err(|e| {
            RepositoryError::DataCorruption(format!("order {}: {e}", row.id))
        })?;
        let payment_status = row.payment_status.parse::<PaymentStatus>().map_err(|e| {
            RepositoryError::DataCorruption(format!("order {}: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            items: row.items.0,
            amount: row.amount,
            address_id: row.address_id,
            payment_method,
            payment_status,
            payment_reference: row.payment_reference,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Fields for a new order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub items: Vec<LineItem>,
    pub amount: Decimal,
    pub address_id: AddressId,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub payment_reference: Option<String>,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the payment reference is already recorded.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            INSERT INTO greencart.orders
                (user_id, items, amount, address_id, payment_method, payment_status,
                 payment_reference, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(order.user_id)
        .bind(Json(&order.items))
        .bind(order.amount)
        .bind(order.address_id)
        .bind(order.payment_method.as_str())
        .bind(order.payment_status.as_str())
        .bind(order.payment_reference.as_deref())
        .bind(ORDER_PLACED)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "payment reference"))?;

        row.try_into()
    }

    /// Look up the order carrying a provider payment reference.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_payment_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM greencart.orders WHERE payment_reference = $1"
        ))
        .bind(reference)
        .fetch_optional(self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    /// Mark an order paid, recording the reference unless one is already set.
    ///
    /// Marking an already-paid order again is a no-op that returns the order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no order has this ID.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_paid(&self, id: OrderId, reference: &str) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            UPDATE greencart.orders
               SET payment_status = $2,
                   payment_reference = COALESCE(payment_reference, $3),
                   updated_at = now()
             WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(PaymentStatus::Paid.as_str())
        .bind(reference)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "payment reference"))?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Delete an order that is still awaiting payment.
    ///
    /// Returns whether a row was deleted; paid and cash orders are never removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete_unpaid(&self, id: OrderId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM greencart.orders WHERE id = $1 AND payment_status = $2",
        )
        .bind(id)
        .bind(PaymentStatus::AwaitingPayment.as_str())
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Order history for a user, newest first: cash orders and paid online orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored enum is invalid.
    pub async fn list_for_customer(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS}
              FROM greencart.orders
             WHERE user_id = $1
               AND (payment_method = $2 OR payment_status = $3)
             ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(user_id)
        .bind(PaymentMethod::CashOnDelivery.as_str())
        .bind(PaymentStatus::Paid.as_str())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }
}
