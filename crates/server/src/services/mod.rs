//! Business logic services for the GreenCart API.
//!
//! # Services
//!
//! - `checkout` - Server-side order pricing and ownership checks

pub mod checkout;

pub use checkout::{PricedOrder, PricingError, prepare_order, price_items};
