//! Exact percentage values.

use rust_decimal::Decimal;
use serde::de;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::domain::error::PercentageError;

/// A fraction in the closed interval [0, 1], stored as an exact decimal.
///
/// `Percentage::from_str("0.1")` is exactly one tenth, so summing ten of them
/// gives exactly one. Serialized as a JSON number (`0.25`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Percentage(Decimal);

impl Percentage {
    /// Create a percentage, rejecting values outside [0, 1].
    pub fn new(value: Decimal) -> Result<Self, PercentageError> {
        if value < Decimal::ZERO || value > Decimal::ONE {
            return Err(PercentageError::OutOfRange(value));
        }
        Ok(Self(value.normalize()))
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn one() -> Self {
        Self(Decimal::ONE)
    }

    /// The underlying decimal fraction.
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl FromStr for Percentage {
    type Err = PercentageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim())
            .map_err(|_| PercentageError::Invalid(s.to_string()))?;
        Self::new(value)
    }
}

impl TryFrom<Decimal> for Percentage {
    type Error = PercentageError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", (self.0 * Decimal::ONE_HUNDRED).normalize())
    }
}

// Numbers travel as their exact decimal text, never through `f64`.
impl Serialize for Percentage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::arbitrary_precision::serialize(&self.0, serializer)
    }
}

/// Accepts a JSON number, an integer, or a decimal string (`"0.25"`).
impl<'de> Deserialize<'de> for Percentage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = rust_decimal::serde::arbitrary_precision::deserialize(deserializer)?;
        Percentage::new(value).map_err(de::Error::custom)
    }
}
