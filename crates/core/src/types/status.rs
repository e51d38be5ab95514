//! Payment method and payment status enums.
//!
//! Both are persisted as text; `Display`/`FromStr` give the stored form and
//! serde gives the wire form.

use serde::{Deserialize, Serialize};

/// How an order is paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentMethod {
    /// Paid in cash when the order is delivered.
    #[default]
    #[serde(rename = "COD")]
    CashOnDelivery,
    /// Paid up front through the hosted payment widget.
    #[serde(rename = "Online")]
    Online,
}

impl PaymentMethod {
    /// Stored and wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CashOnDelivery => "COD",
            Self::Online => "Online",
        }
    }

    /// Label of the submit action for this method.
    #[must_use]
    pub const fn action_label(self) -> &'static str {
        match self {
            Self::CashOnDelivery => "Place Order",
            Self::Online => "Pay Now",
        }
    }

    /// Payment status a freshly created order starts in.
    #[must_use]
    pub const fn initial_status(self) -> PaymentStatus {
        match self {
            Self::CashOnDelivery => PaymentStatus::CollectOnDelivery,
            Self::Online => PaymentStatus::AwaitingPayment,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "COD" => Ok(Self::CashOnDelivery),
            "Online" | "ONLINE" => Ok(Self::Online),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

/// Payment state of an order.
///
/// ```text
/// COD:    CollectOnDelivery
/// Online: AwaitingPayment --(webhook / confirmation)--> Paid
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Cash will be collected at the door.
    #[default]
    CollectOnDelivery,
    /// Online payment started but not confirmed.
    AwaitingPayment,
    /// Payment confirmed by the provider.
    Paid,
}

impl PaymentStatus {
    /// Stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CollectOnDelivery => "collect_on_delivery",
            Self::AwaitingPayment => "awaiting_payment",
            Self::Paid => "paid",
        }
    }

    /// Whether money has been received for the order.
    #[must_use]
    pub const fn is_paid(self) -> bool {
        matches!(self, Self::Paid)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "collect_on_delivery" => Ok(Self::CollectOnDelivery),
            "awaiting_payment" => Ok(Self::AwaitingPayment),
            "paid" => Ok(Self::Paid),
            _ => Err(format!("invalid payment status: {s}")),
        }
    }
}
