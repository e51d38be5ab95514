//! GreenCart client library.
//!
//! Owns the browser-side state of the storefront and drives the checkout
//! flow against the REST API:
//!
//! - [`context`] - cart, catalog, user session, route and toast notifications
//! - [`checkout`] - the checkout view: address and payment selection, totals, submission
//! - [`api`] - the REST seam ([`StorefrontApi`]) and its `reqwest` implementation
//! - [`widget`] - the hosted payment widget seam

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod checkout;
pub mod context;
pub mod widget;

pub use api::{ApiError, HttpStorefrontApi, StorefrontApi};
pub use checkout::{CheckoutError, CheckoutLine, CheckoutView, SubmitOutcome};
pub use context::{AppContext, Route, Toast, UserSession};
pub use widget::{PaymentResponse, PaymentWidget, WidgetOptions, WidgetOutcome};
