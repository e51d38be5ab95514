//! Placed order, as returned by the order history endpoint.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cart::LineItem;
use super::id::{AddressId, OrderId, UserId};
use super::status::{PaymentMethod, PaymentStatus};

/// Fulfilment status every new order starts with.
pub const ORDER_PLACED: &str = "Order Placed";

/// An order. Created once per checkout submission and later mutated only by
/// payment confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<LineItem>,
    /// Charged amount (subtotal plus surcharge), computed by the server.
    pub amount: Decimal,
    pub address_id: AddressId,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    /// Provider payment ID once the order is paid online.
    pub payment_reference: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Whether this order belongs in the customer's order history: cash orders
    /// always, online orders only once paid.
    #[must_use]
    pub const fn is_visible_to_customer(&self) -> bool {
        match self.payment_method {
            PaymentMethod::CashOnDelivery => true,
            PaymentMethod::Online => self.payment_status.is_paid(),
        }
    }
}
