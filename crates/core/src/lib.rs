//! GreenCart Core - Shared domain types.
//!
//! This crate provides the types shared by every GreenCart component:
//! - `server` - REST backend (catalog, addresses, orders, payments)
//! - `client` - Storefront state container and checkout flow
//! - `cli` - Migrations and fixture seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Pricing rules live here so the client summary, the
//! client submission and the server all compute totals the same way.
//!
//! # Modules
//!
//! - [`types`] - IDs, prices, cart, catalog, addresses, orders and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
