//! Storefront state container.
//!
//! [`AppContext`] is passed explicitly to the views that need it. State changes
//! only through its methods, so cart quantities stay positive and derived
//! values stay consistent with the catalog.

use greencart_core::{Cart, CurrencyCode, Price, Product, ProductId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The signed-in customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

/// Pages the storefront can navigate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    Home,
    Products,
    Cart,
    Checkout,
    MyOrders,
}

impl Route {
    /// Browser path for the route.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Products => "/products",
            Self::Cart => "/cart",
            Self::Checkout => "/checkout",
            Self::MyOrders => "/my-orders",
        }
    }
}

/// A pending notification for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toast {
    Success(String),
    Error(String),
}

impl Toast {
    /// The notification text.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Success(m) | Self::Error(m) => m,
        }
    }
}

/// Client-side application state.
#[derive(Debug, Clone, Default)]
pub struct AppContext {
    products: Vec<Product>,
    cart: Cart,
    user: Option<UserSession>,
    currency: CurrencyCode,
    route: Route,
    toasts: Vec<Toast>,
}

impl AppContext {
    /// Empty state for a store trading in `currency`.
    #[must_use]
    pub fn new(currency: CurrencyCode) -> Self {
        Self {
            currency,
            ..Self::default()
        }
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Replace the catalog.
    pub fn set_products(&mut self, products: Vec<Product>) {
        self.products = products;
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Look up a catalog entry.
    #[must_use]
    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    // =========================================================================
    // Cart
    // =========================================================================

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Add one unit of a product.
    pub fn add_to_cart(&mut self, id: ProductId) {
        self.cart.add(id);
        self.toasts.push(Toast::Success("Added to Cart".to_string()));
    }

    /// Set a product's quantity; zero removes it.
    pub fn update_cart_item(&mut self, id: ProductId, quantity: u32) {
        self.cart.set_quantity(id, quantity);
    }

    /// Remove one unit of a product.
    pub fn remove_from_cart(&mut self, id: ProductId) {
        self.cart.remove_one(id);
        self.toasts.push(Toast::Success("Removed from Cart".to_string()));
    }

    pub fn clear_cart(&mut self) {
        self.cart.clear();
    }

    /// Units in the cart across all products.
    #[must_use]
    pub fn cart_count(&self) -> u32 {
        self.cart.total_quantity()
    }

    /// Cart subtotal at current catalog prices. Products no longer in the
    /// catalog contribute nothing.
    #[must_use]
    pub fn cart_amount(&self) -> Decimal {
        self.cart
            .iter()
            .filter_map(|(id, quantity)| self.product(id).map(|p| p.line_total(quantity)))
            .sum()
    }

    /// Format an amount in the store currency.
    #[must_use]
    pub fn format_amount(&self, amount: Decimal) -> String {
        Price::new(amount, self.currency).display()
    }

    // =========================================================================
    // Session, navigation, notifications
    // =========================================================================

    pub fn set_user(&mut self, user: Option<UserSession>) {
        self.user = user;
    }

    #[must_use]
    pub const fn user(&self) -> Option<&UserSession> {
        self.user.as_ref()
    }

    pub fn navigate(&mut self, route: Route) {
        tracing::debug!(path = route.path(), "navigate");
        self.route = route;
    }

    #[must_use]
    pub const fn route(&self) -> Route {
        self.route
    }

    pub fn toast_success(&mut self, message: impl Into<String>) {
        self.toasts.push(Toast::Success(message.into()));
    }

    pub fn toast_error(&mut self, message: impl Into<String>) {
        self.toasts.push(Toast::Error(message.into()));
    }

    /// Pending notifications, oldest first.
    #[must_use]
    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    /// Drain pending notifications for display.
    pub fn take_toasts(&mut self) -> Vec<Toast> {
        std::mem::take(&mut self.toasts)
    }
}
