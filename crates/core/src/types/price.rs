//! Prices, currencies and the checkout pricing rule.
//!
//! The checkout total is the cart subtotal plus a fixed 2% surcharge, rounded
//! to two decimal places. [`checkout_total`] is the only place that rule is
//! written down; the client summary, the client submission and the server all
//! call it.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Surcharge applied on top of the cart subtotal, in percent.
pub const SURCHARGE_PERCENT: Decimal = Decimal::TWO;

/// Surcharge owed on a subtotal (unrounded).
#[must_use]
pub fn surcharge(subtotal: Decimal) -> Decimal {
    subtotal * SURCHARGE_PERCENT / Decimal::ONE_HUNDRED
}

/// Amount charged for a subtotal: `subtotal * 1.02`, rounded half away from
/// zero to two decimal places.
///
/// ```
/// use greencart_core::checkout_total;
/// use rust_decimal::Decimal;
///
/// assert_eq!(checkout_total(Decimal::from(25)), Decimal::new(2550, 2));
/// ```
#[must_use]
pub fn checkout_total(subtotal: Decimal) -> Decimal {
    (subtotal + surcharge(subtotal)).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., rupees, not paise).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Format for display, always with two decimals (e.g., "₹25.50").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{:.2}", self.currency_code.symbol(), self.amount)
    }
}

/// ISO 4217 currency codes accepted by the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    INR,
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// Display symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::INR => "₹",
            Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// Three-letter code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::INR => "INR",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
        }
    }

    /// Number of decimal digits in the minor unit (paise, cents, pence).
    #[must_use]
    pub const fn minor_unit_digits(self) -> u32 {
        2
    }

    /// Convert a standard-unit amount to minor units, rounding to the nearest unit.
    ///
    /// Returns `None` if the amount overflows or does not fit in an `i64`.
    #[must_use]
    pub fn to_minor_units(self, amount: Decimal) -> Option<i64> {
        let scale = Decimal::from(10_i64.pow(self.minor_unit_digits()));
        amount
            .checked_mul(scale)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INR" => Ok(Self::INR),
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}
