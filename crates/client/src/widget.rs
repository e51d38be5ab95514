//! Hosted payment widget seam.
//!
//! The browser opens Razorpay's checkout modal; here it is a trait so the
//! checkout flow can run against a scripted widget in tests.

use std::future::Future;

use serde::{Deserialize, Serialize};

/// Store name shown in the widget header.
pub const STORE_NAME: &str = "GreenCart";

/// Description shown under the amount.
pub const PAYMENT_DESCRIPTION: &str = "Order Payment";

/// Options the widget is opened with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WidgetOptions {
    /// Public key ID.
    pub key: String,
    /// Amount in the smallest currency unit.
    pub amount: i64,
    /// ISO currency code.
    pub currency: String,
    pub name: String,
    pub description: String,
    /// Provider order ID to pay against.
    pub order_id: String,
}

/// Payload the widget hands back after a successful payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentResponse {
    #[serde(rename = "razorpay_payment_id")]
    pub payment_id: String,
    #[serde(rename = "razorpay_order_id", default)]
    pub order_id: Option<String>,
    #[serde(rename = "razorpay_signature", default)]
    pub signature: Option<String>,
}

/// How the widget was closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetOutcome {
    /// The customer paid.
    Completed(PaymentResponse),
    /// The customer closed the widget without paying.
    Dismissed,
}

/// A hosted payment widget.
pub trait PaymentWidget {
    /// Open the widget and wait until the customer pays or closes it.
    fn open(&mut self, options: WidgetOptions) -> impl Future<Output = WidgetOutcome> + Send;
}
