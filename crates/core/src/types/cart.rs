//! Shopping cart and order line items.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// Client-side shopping cart: product ID to quantity.
///
/// Every present key has a quantity of at least 1; setting a quantity to 0
/// removes the key, and an absent key means zero. Iteration is ordered by
/// product ID. Deserializing drops zero entries so the invariant also holds
/// for carts read back from storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<ProductId, u32>",
    into = "BTreeMap<ProductId, u32>"
)]
pub struct Cart {
    items: BTreeMap<ProductId, u32>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }

    /// Quantity of a product (0 if absent).
    #[must_use]
    pub fn quantity(&self, product_id: ProductId) -> u32 {
        self.items.get(&product_id).copied().unwrap_or(0)
    }

    /// Set the quantity of a product; 0 removes it.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: u32) {
        if quantity == 0 {
            self.items.remove(&product_id);
        } else {
            self.items.insert(product_id, quantity);
        }
    }

    /// Add one unit of a product.
    pub fn add(&mut self, product_id: ProductId) {
        let entry = self.items.entry(product_id).or_insert(0);
        *entry = entry.saturating_add(1);
    }

    /// Remove one unit of a product, dropping the key when it reaches zero.
    pub fn remove_one(&mut self, product_id: ProductId) {
        let quantity = self.quantity(product_id);
        self.set_quantity(product_id, quantity.saturating_sub(1));
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Whether the cart holds no products.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Total number of units across all products.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.items.values().fold(0, |acc, q| acc.saturating_add(*q))
    }

    /// Iterate `(product, quantity)` pairs in product ID order.
    pub fn iter(&self) -> impl Iterator<Item = (ProductId, u32)> + '_ {
        self.items.iter().map(|(id, q)| (*id, *q))
    }
}

impl From<BTreeMap<ProductId, u32>> for Cart {
    fn from(items: BTreeMap<ProductId, u32>) -> Self {
        items.into_iter().collect()
    }
}

impl From<Cart> for BTreeMap<ProductId, u32> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}

impl FromIterator<(ProductId, u32)> for Cart {
    fn from_iter<I: IntoIterator<Item = (ProductId, u32)>>(iter: I) -> Self {
        let mut cart = Self::new();
        for (id, quantity) in iter {
            cart.set_quantity(id, quantity);
        }
        cart
    }
}

/// A (product, quantity) pair recorded on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product being ordered.
    #[serde(rename = "product")]
    pub product_id: ProductId,
    /// Units ordered.
    pub quantity: u32,
}

impl LineItem {
    /// Create a line item.
    #[must_use]
    pub const fn new(product_id: ProductId, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn id(n: i32) -> ProductId {
        ProductId::new(n)
    }

    #[test]
    fn test_absent_key_is_zero() {
        let cart = Cart::new();
        assert_eq!(cart.quantity(id(1)), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_zero_removes_key() {
        let mut cart = Cart::new();
        cart.set_quantity(id(1), 3);
        cart.set_quantity(id(1), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_and_remove_one() {
        let mut cart = Cart::new();
        cart.add(id(7));
        cart.add(id(7));
        assert_eq!(cart.quantity(id(7)), 2);

        cart.remove_one(id(7));
        cart.remove_one(id(7));
        assert_eq!(cart.len(), 0);

        // removing from an absent key is a no-op
        cart.remove_one(id(7));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_total_quantity() {
        let cart: Cart = [(id(1), 2), (id(2), 1)].into_iter().collect();
        assert_eq!(cart.total_quantity(), 3);
    }

    #[test]
    fn test_deserialize_drops_zero_quantities() {
        let cart: Cart = serde_json::from_str(r#"{"1": 2, "2": 0}"#).unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.quantity(id(1)), 2);
    }

    #[test]
    fn test_iterates_in_id_order() {
        let cart: Cart = [(id(9), 1), (id(2), 4)].into_iter().collect();
        let ids: Vec<_> = cart.iter().map(|(id, _)| id.as_i32()).collect();
        assert_eq!(ids, vec![2, 9]);
    }

    #[test]
    fn test_line_item_wire_format() {
        let json = serde_json::to_value(LineItem::new(id(4), 2)).unwrap();
        assert_eq!(json, serde_json::json!({ "product": 4, "quantity": 2 }));
    }
}
