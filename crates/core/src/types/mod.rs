//! Core types for GreenCart.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod cart;
pub mod id;
pub mod order;
pub mod price;
pub mod product;
pub mod status;

pub use address::Address;
pub use cart::{Cart, LineItem};
pub use id::*;
pub use order::{ORDER_PLACED, Order};
pub use price::{CurrencyCode, Price, SURCHARGE_PERCENT, checkout_total, surcharge};
pub use product::Product;
pub use status::*;
