//! Type-safe price representation.
//!
//! The Shop API reports every monetary amount as an integer in the minor
//! currency unit (cents for USD). Conversion to a display amount goes through
//! `rust_decimal` so formatting never suffers from float rounding.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price in minor currency units with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the smallest currency unit (e.g., cents for USD).
    pub minor_units: i64,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(minor_units: i64, currency_code: CurrencyCode) -> Self {
        Self {
            minor_units,
            currency_code,
        }
    }

    /// The amount in the currency's standard unit (e.g., dollars, not cents).
    #[must_use]
    pub fn amount(&self) -> Decimal {
        Decimal::new(self.minor_units, 2)
    }

    /// Format for display (e.g., "$19.99").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{:.2}", self.currency_code.symbol(), self.amount())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes the storefront knows how to format.
///
/// Unknown codes from the API map to [`CurrencyCode::Other`] and are
/// formatted with a trailing code instead of a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
    Other,
}

impl CurrencyCode {
    /// Currency symbol used as a display prefix.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
            Self::Other => "",
        }
    }

    /// ISO 4217 code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::CAD => "CAD",
            Self::AUD => "AUD",
            Self::Other => "XXX",
        }
    }
}

impl From<String> for CurrencyCode {
    fn from(code: String) -> Self {
        match code.to_ascii_uppercase().as_str() {
            "USD" => Self::USD,
            "EUR" => Self::EUR,
            "GBP" => Self::GBP,
            "CAD" => Self::CAD,
            "AUD" => Self::AUD,
            _ => Self::Other,
        }
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.code().to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_minor_units() {
        assert_eq!(Price::new(1999, CurrencyCode::USD).display(), "$19.99");
        assert_eq!(Price::new(5, CurrencyCode::GBP).display(), "£0.05");
        assert_eq!(Price::new(120_000, CurrencyCode::EUR).to_string(), "€1200.00");
    }

    #[test]
    fn test_currency_code_from_api_string() {
        assert_eq!(CurrencyCode::from("usd".to_string()), CurrencyCode::USD);
        assert_eq!(CurrencyCode::from("JPY".to_string()), CurrencyCode::Other);
    }

    #[test]
    fn test_currency_code_serde() {
        let code: CurrencyCode = serde_json::from_str("\"CAD\"").unwrap();
        assert_eq!(code, CurrencyCode::CAD);
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"CAD\"");
    }
}
