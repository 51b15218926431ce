//! Fixed-point transaction amounts.

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, Result};

/// A non-negative monetary amount with two decimal places.
///
/// Always rendered for the processor as a plain decimal string with exactly
/// two fractional digits, independent of locale and without grouping
/// separators.
///
/// # Examples
///
/// ```
/// use moneris_gateway::models::Amount;
/// use rust_decimal::Decimal;
///
/// let amount = Amount::new(Decimal::new(95, 1)).unwrap();
/// assert_eq!(amount.to_processor_string(), "9.50");
///
/// let amount = Amount::from_minor_units(100_000).unwrap();
/// assert_eq!(amount.to_processor_string(), "1000.00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates an amount, rounding half away from zero to two decimal places.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidInput`] if the value is negative.
    pub fn new(value: Decimal) -> Result<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(GatewayError::InvalidInput(format!("amount must not be negative: {value}")));
        }
        let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(2);
        rounded.set_sign_positive(true);
        Ok(Self(rounded))
    }

    /// Creates an amount from cents.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidInput`] if `cents` is negative.
    pub fn from_minor_units(cents: i64) -> Result<Self> {
        Self::new(Decimal::new(cents, 2))
    }

    /// Creates an amount from a floating-point host value.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidInput`] if the value is negative, NaN or infinite.
    pub fn from_f64(value: f64) -> Result<Self> {
        let decimal = Decimal::try_from(value)
            .map_err(|e| GatewayError::InvalidInput(format!("amount is not representable: {e}")))?;
        Self::new(decimal)
    }

    /// Returns the underlying decimal value.
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }

    /// Formats the amount as the processor expects it, e.g. `"1000.00"`.
    #[must_use]
    pub fn to_processor_string(self) -> String {
        format!("{:.2}", self.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = GatewayError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_amount_gets_two_places() {
        let amount = Amount::new(Decimal::from(1000)).unwrap();
        assert_eq!(amount.to_processor_string(), "1000.00");
    }

    #[test]
    fn test_single_decimal_is_padded() {
        let amount = Amount::new(Decimal::new(95, 1)).unwrap();
        assert_eq!(amount.to_processor_string(), "9.50");
    }

    #[test]
    fn test_extra_places_round_half_away_from_zero() {
        assert_eq!(Amount::new(Decimal::new(10_005, 3)).unwrap().to_processor_string(), "10.01");
        assert_eq!(Amount::new(Decimal::new(10_004, 3)).unwrap().to_processor_string(), "10.00");
    }

    #[test]
    fn test_large_amount_has_no_separators() {
        let amount = Amount::from_minor_units(123_456_789).unwrap();
        assert_eq!(amount.to_processor_string(), "1234567.89");
    }

    #[test]
    fn test_zero_is_allowed() {
        assert_eq!(Amount::ZERO.to_processor_string(), "0.00");
        assert_eq!(Amount::new(Decimal::ZERO).unwrap().to_processor_string(), "0.00");
    }

    #[test]
    fn test_negative_rejected() {
        assert!(matches!(Amount::new(Decimal::new(-1, 2)), Err(GatewayError::InvalidInput(_))));
        assert!(Amount::from_minor_units(-500).is_err());
    }

    #[test]
    fn test_from_f64() {
        assert_eq!(Amount::from_f64(9.5).unwrap().to_processor_string(), "9.50");
        assert_eq!(Amount::from_f64(19.99).unwrap().to_processor_string(), "19.99");
        assert!(Amount::from_f64(f64::NAN).is_err());
        assert!(Amount::from_f64(-0.01).is_err());
    }

    #[test]
    fn test_negative_zero_renders_unsigned() {
        assert_eq!(Amount::new(-Decimal::ZERO).unwrap().to_processor_string(), "0.00");
        assert_eq!(Amount::from_f64(-0.0).unwrap().to_processor_string(), "0.00");
        assert_eq!(Amount::new(Decimal::new(-0, 3)).unwrap().to_string(), "0.00");
    }

    #[test]
    fn test_display_matches_processor_string() {
        let amount = Amount::from_minor_units(4250).unwrap();
        assert_eq!(amount.to_string(), amount.to_processor_string());
    }
}
