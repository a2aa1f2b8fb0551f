//! Amount - Non-negative integral decimal for raw coin units
//!
//! Every coin amount held by an account, a position or a claim payout is a
//! whole number of raw units and never negative. Both properties are enforced
//! at construction time.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur when working with amounts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount cannot be negative: {0}")]
    NegativeAmount(Decimal),

    #[error("Amount must be a whole number of raw units: {0}")]
    FractionalAmount(Decimal),
}

/// A non-negative whole number of raw units.
///
/// # Invariant
/// The inner value is always >= 0, has no fractional part and is stored with
/// scale 0 so its serialized form is stable.
///
/// # Example
/// ```
/// use hard_core::Amount;
/// use rust_decimal::Decimal;
///
/// let amount = Amount::new(Decimal::new(100, 0)).unwrap();
/// assert_eq!(amount.value(), Decimal::new(100, 0));
///
/// // Negative and fractional amounts are rejected
/// assert!(Amount::new(Decimal::new(-100, 0)).is_err());
/// assert!(Amount::new(Decimal::new(15, 1)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Zero amount constant
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new Amount from a Decimal.
    ///
    /// Returns an error if the value is negative or fractional.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value < Decimal::ZERO {
            return Err(AmountError::NegativeAmount(value));
        }
        if !value.fract().is_zero() {
            return Err(AmountError::FractionalAmount(value));
        }
        Ok(Self(value.trunc()))
    }

    /// Amount from a count of raw units
    pub fn from_units(units: u64) -> Self {
        Self(Decimal::from(units))
    }

    /// Truncate a decimal toward zero into whole units.
    ///
    /// Used wherever a factor-normalized value is realized into a balance.
    pub fn from_decimal_trunc(value: Decimal) -> Result<Self, AmountError> {
        Self::new(value.trunc())
    }

    /// Get the inner Decimal value
    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Check if the amount is zero
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checked addition - returns None on overflow
    pub fn checked_add(&self, other: &Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    /// Checked subtraction - returns None if result would be negative
    pub fn checked_sub(&self, other: &Amount) -> Option<Amount> {
        let result = self.0.checked_sub(other.0)?;
        if result < Decimal::ZERO {
            None
        } else {
            Some(Amount(result))
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::ZERO
    }
}
