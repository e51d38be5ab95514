//! GreenCart API server library.
//!
//! The binary in `main.rs` wires configuration, tracing and Sentry around
//! [`routes::app`]; everything else lives here so it can be exercised by the
//! integration tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod payments;
pub mod routes;
pub mod services;
pub mod state;

pub use routes::app;
pub use state::AppState;
