//! Monetary amounts as returned by the remote checkout service.
//!
//! Amounts stay in their decimal string form so they are byte-for-byte what
//! the service computed. [`Money::to_decimal`] exists for display only.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Decimal amount kept as the string the remote service returned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(String);

impl Money {
    /// Wrap a decimal string.
    #[must_use]
    pub fn new(amount: impl Into<String>) -> Self {
        Self(amount.into())
    }

    /// The amount as returned by the service.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether no amount has been received yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse the amount for formatting. Returns `None` when empty or malformed.
    #[must_use]
    pub fn to_decimal(&self) -> Option<Decimal> {
        self.0.trim().parse::<Decimal>().ok()
    }

    /// Format for display with two decimal places (e.g. `$19.90`).
    ///
    /// Shows `-` before any amount is known, and falls back to the raw string
    /// when it does not parse.
    #[must_use]
    pub fn display(&self) -> String {
        if self.is_empty() {
            return "-".to_string();
        }
        self.to_decimal().map_or_else(
            || format!("${}", self.0),
            |amount| format!("${:.2}", amount.round_dp(2)),
        )
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Money {
    fn from(amount: &str) -> Self {
        Self(amount.to_owned())
    }
}

impl From<String> for Money {
    fn from(amount: String) -> Self {
        Self(amount)
    }
}

/// Subtotal, tax and total from a single remote response.
///
/// The three amounts only exist together: [`PriceTriple::from_parts`] refuses
/// to build a triple unless every part is present and non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTriple {
    /// Subtotal before tax.
    pub subtotal_price: Money,
    /// Total tax.
    pub total_tax: Money,
    /// Grand total.
    pub total_price: Money,
}

impl PriceTriple {
    /// Build a triple only if all three amounts are present and non-empty.
    #[must_use]
    pub fn from_parts(
        subtotal_price: Option<Money>,
        total_tax: Option<Money>,
        total_price: Option<Money>,
    ) -> Option<Self> {
        let present = |m: Option<Money>| m.filter(|m| !m.is_empty());
        Some(Self {
            subtotal_price: present(subtotal_price)?,
            total_tax: present(total_tax)?,
            total_price: present(total_price)?,
        })
    }
}
