//! Currency codes and display-price rendering.
//!
//! All financial arithmetic in Grove happens on `i64` amounts in the
//! currency's minor unit (cents, pence, yen). `DisplayPrice` exists only to
//! render those amounts for humans and is never an input to a computation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// ISO 4217 currency codes supported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    JPY,
    CAD,
    AUD,
}

impl CurrencyCode {
    /// Currency symbol for display.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
            Self::JPY => "¥",
        }
    }

    /// ISO 4217 alphabetic code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::JPY => "JPY",
            Self::CAD => "CAD",
            Self::AUD => "AUD",
        }
    }

    /// Number of minor-unit digits (ISO 4217 exponent).
    ///
    /// JPY has no minor unit; everything else here uses two digits.
    #[must_use]
    pub const fn exponent(self) -> u32 {
        match self {
            Self::JPY => 0,
            Self::USD | Self::EUR | Self::GBP | Self::CAD | Self::AUD => 2,
        }
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Error returned when parsing an unknown currency code.
#[derive(Debug, Error)]
#[error("unknown currency code: {0}")]
pub struct ParseCurrencyError(String);

impl std::str::FromStr for CurrencyCode {
    type Err = ParseCurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            "JPY" => Ok(Self::JPY),
            "CAD" => Ok(Self::CAD),
            "AUD" => Ok(Self::AUD),
            other => Err(ParseCurrencyError(other.to_owned())),
        }
    }
}

/// A minor-unit amount paired with its currency, for display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayPrice {
    /// Amount in the currency's minor unit.
    pub amount: i64,
    /// ISO 4217 currency code.
    pub currency: CurrencyCode,
}

impl DisplayPrice {
    /// Create a display price from a minor-unit amount.
    #[must_use]
    pub const fn new(amount: i64, currency: CurrencyCode) -> Self {
        Self { amount, currency }
    }

    /// Decimal value in the currency's major unit (e.g. cents -> dollars).
    #[must_use]
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.amount, self.currency.exponent())
    }
}

impl std::fmt::Display for DisplayPrice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.currency.symbol(), self.to_decimal())
    }
}
