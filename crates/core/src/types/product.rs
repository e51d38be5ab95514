//! Catalog product.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// A catalog entry. Read-only from the checkout's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: Vec<String>,
    /// List price.
    pub price: Decimal,
    /// Discounted price, when the product is on offer.
    #[serde(default)]
    pub offer_price: Option<Decimal>,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
}

const fn default_in_stock() -> bool {
    true
}

impl Product {
    /// Price a customer pays per unit: the offer price if any, else the list price.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        self.offer_price.unwrap_or(self.price)
    }

    /// Price of `quantity` units.
    #[must_use]
    pub fn line_total(&self, quantity: u32) -> Decimal {
        self.unit_price() * Decimal::from(quantity)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn apples() -> Product {
        Product {
            id: ProductId::new(1),
            name: "Apples 1kg".to_string(),
            category: "Fruits".to_string(),
            description: vec![],
            price: Decimal::from(12),
            offer_price: None,
            in_stock: true,
        }
    }

    #[test]
    fn test_unit_price_prefers_offer() {
        let mut product = apples();
        assert_eq!(product.unit_price(), Decimal::from(12));

        product.offer_price = Some(Decimal::from(10));
        assert_eq!(product.unit_price(), Decimal::from(10));
        assert_eq!(product.line_total(3), Decimal::from(30));
    }

    #[test]
    fn test_deserialize_defaults() {
        let json = r#"{"id": 3, "name": "Milk", "category": "Dairy", "price": "5"}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert!(product.in_stock);
        assert!(product.offer_price.is_none());
        assert!(product.description.is_empty());
    }
}
