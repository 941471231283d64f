//! Monetary amounts and currency codes.
//!
//! Stripe reports amounts as integer minor units. Locally they are stored as
//! fixed-point decimals with two places so no float ever touches a balance.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// Number of decimal places kept for stored amounts.
pub const MONEY_SCALE: u32 = 2;

/// Converts provider minor units (cents) to a two-place decimal amount.
pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, MONEY_SCALE)
}

/// Rounds a computed amount to the stored scale (banker's rounding).
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp(MONEY_SCALE)
}

/// ISO-4217 currency code, normalized to lowercase as Stripe sends it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Parses a three-letter alphabetic code, case-insensitively.
    pub fn new(code: impl AsRef<str>) -> Result<Self, ValidationError> {
        let code = code.as_ref().trim();
        if code.is_empty() {
            return Err(ValidationError::empty_field("currency"));
        }
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::invalid_format(
                "currency",
                format!("expected a 3-letter code, got '{}'", code),
            ));
        }
        Ok(Self(code.to_ascii_lowercase()))
    }

    /// US dollars, the default when a payload omits the currency.
    pub fn usd() -> Self {
        Self("usd".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::usd()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Currency {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Currency::new(value)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;

    #[test]
    fn converts_cents_to_exact_decimal() {
        let amount = from_minor_units(2599);
        assert_eq!(amount, Decimal::from_str("25.99").unwrap());
        assert_eq!(amount.to_string(), "25.99");
    }

    #[test]
    fn zero_and_negative_amounts_keep_scale() {
        assert_eq!(from_minor_units(0).to_string(), "0.00");
        assert_eq!(from_minor_units(-150).to_string(), "-1.50");
    }

    #[test]
    fn round_money_uses_two_places() {
        let value = Decimal::from_str("8.3333").unwrap();
        assert_eq!(round_money(value).to_string(), "8.33");
    }

    #[test]
    fn currency_is_lowercased() {
        assert_eq!(Currency::new("USD").unwrap().as_str(), "usd");
    }

    #[test]
    fn currency_rejects_bad_codes() {
        assert!(Currency::new("").is_err());
        assert!(Currency::new("us").is_err());
        assert!(Currency::new("u$d").is_err());
    }

    #[test]
    fn currency_deserializes_through_validation() {
        let currency: Currency = serde_json::from_str("\"EUR\"").unwrap();
        assert_eq!(currency.as_str(), "eur");
        assert!(serde_json::from_str::<Currency>("\"euros\"").is_err());
    }

    proptest! {
        #[test]
        fn minor_units_scale_back_exactly(minor in -1_000_000_000i64..1_000_000_000i64) {
            let amount = from_minor_units(minor);
            prop_assert_eq!(amount * Decimal::from(100), Decimal::from(minor));
            prop_assert_eq!(amount.scale(), MONEY_SCALE);
        }
    }
}
