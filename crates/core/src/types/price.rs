//! Type-safe price representation in integer minor currency units.
//!
//! Prices are carried as whole cents (or the equivalent minor unit) to keep
//! arithmetic exact - no floating point anywhere in the cart math. The server
//! is the source of truth for price values; this type only validates and
//! formats them.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is negative.
    #[error("price cannot be negative: {amount}")]
    Negative {
        /// The rejected amount in minor units.
        amount: i64,
    },
}

/// A non-negative price in minor currency units (e.g., cents for USD).
///
/// ## Constraints
///
/// - Amount is always `>= 0`
///
/// ## Examples
///
/// ```
/// use opaline_core::Price;
///
/// let price = Price::from_minor_units(129_900).expect("non-negative");
/// assert_eq!(price.minor_units(), 129_900);
/// assert_eq!(price.to_string(), "$1299.00");
/// ```
///
/// Serializes as a bare number; deserialization re-validates non-negativity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(try_from = "i64", into = "i64")]
pub struct Price(i64);

impl Price {
    /// A zero price.
    pub const ZERO: Self = Self(0);

    /// Create a price from an amount in minor currency units.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `amount` is below zero.
    pub const fn from_minor_units(amount: i64) -> Result<Self, PriceError> {
        if amount < 0 {
            return Err(PriceError::Negative { amount });
        }
        Ok(Self(amount))
    }

    /// Get the amount in minor currency units.
    #[must_use]
    pub const fn minor_units(&self) -> i64 {
        self.0
    }

    /// Multiply by a unitless count, saturating at `i64::MAX`.
    ///
    /// Saturation rather than wrapping keeps a hostile or corrupt quantity
    /// from producing a negative total.
    #[must_use]
    pub const fn saturating_mul(&self, count: u32) -> Self {
        Self(self.0.saturating_mul(count as i64))
    }

    /// Add another price, saturating at `i64::MAX`.
    #[must_use]
    pub const fn saturating_add(&self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl TryFrom<i64> for Price {
    type Error = PriceError;

    fn try_from(amount: i64) -> Result<Self, Self::Error> {
        Self::from_minor_units(amount)
    }
}

impl From<Price> for i64 {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl fmt::Display for Price {
    /// Format as a dollar string (e.g., `"$19.99"`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}
