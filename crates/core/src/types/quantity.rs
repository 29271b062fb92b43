//! Cart line quantity and the validation policy around it.
//!
//! The bounds are a business rule, not a UI limitation: a single cart line
//! carries between 1 and 10 units. Requests below the lower bound mean
//! "remove the line"; requests above the upper bound are refused outright so
//! the caller can surface a precise error instead of a silently clamped
//! value.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when validating a requested quantity.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// The input could not be coerced to an integer.
    #[error("quantity is not a number: {input:?}")]
    Invalid {
        /// The rejected raw input.
        input: String,
    },
    /// The requested quantity exceeds the per-line maximum.
    #[error("quantity {requested} is outside the allowed range 1..=10")]
    OutOfRange {
        /// The rejected quantity.
        requested: i64,
    },
}

/// A validated cart line quantity.
///
/// ## Constraints
///
/// - `1 <= quantity <= 10`
///
/// A value of zero is never representable; driving a line's quantity to zero
/// removes the line instead (see [`evaluate`]).
///
/// Serializes as a bare number; deserialization re-validates the bounds so a
/// tampered or corrupt persisted value cannot construct an invalid quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    /// The smallest representable quantity.
    pub const MIN: Self = Self(1);
    /// The largest quantity a single cart line may carry.
    pub const MAX: Self = Self(10);
    /// One unit, the default for "add to cart" without an explicit count.
    pub const ONE: Self = Self(1);

    /// Create a quantity, returning `None` when out of bounds.
    #[must_use]
    pub const fn new(value: u32) -> Option<Self> {
        if value >= Self::MIN.0 && value <= Self::MAX.0 {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Get the underlying count.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for Quantity {
    type Error = QuantityError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(QuantityError::OutOfRange {
            requested: i64::from(value),
        })
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

/// Outcome of validating a requested quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityDecision {
    /// The line's quantity becomes this value.
    Set(Quantity),
    /// The request drives the quantity below one: remove the line.
    Remove,
}

/// Validate a requested quantity against the line bounds.
///
/// - `requested < 1` is a removal signal, not an error
/// - `requested > 10` is refused, never clamped
///
/// Pure function, no side effects.
///
/// # Errors
///
/// Returns [`QuantityError::OutOfRange`] when `requested` exceeds the
/// per-line maximum.
pub const fn evaluate(requested: i64) -> Result<QuantityDecision, QuantityError> {
    if requested < Quantity::MIN.0 as i64 {
        return Ok(QuantityDecision::Remove);
    }
    if requested > Quantity::MAX.0 as i64 {
        return Err(QuantityError::OutOfRange { requested });
    }
    // Bounds checked above, the cast cannot truncate.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let value = requested as u32;
    Ok(QuantityDecision::Set(Quantity(value)))
}

/// Coerce a textual quantity (e.g., a form field) and validate it.
///
/// # Errors
///
/// Returns [`QuantityError::Invalid`] for non-numeric input and
/// [`QuantityError::OutOfRange`] when the value exceeds the per-line maximum.
pub fn parse(input: &str) -> Result<QuantityDecision, QuantityError> {
    let requested: i64 = input
        .trim()
        .parse()
        .map_err(|_| QuantityError::Invalid {
            input: input.to_string(),
        })?;
    evaluate(requested)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_bounds() {
        assert_eq!(Quantity::new(0), None);
        assert_eq!(Quantity::new(1), Some(Quantity::MIN));
        assert_eq!(Quantity::new(10), Some(Quantity::MAX));
        assert_eq!(Quantity::new(11), None);
    }

    #[test]
    fn test_evaluate_in_range() {
        for q in 1..=10 {
            let decision = evaluate(q).expect("in range");
            assert_eq!(
                decision,
                QuantityDecision::Set(Quantity::new(u32::try_from(q).expect("small")).expect("valid"))
            );
        }
    }

    #[test]
    fn test_evaluate_below_one_is_removal() {
        assert_eq!(evaluate(0), Ok(QuantityDecision::Remove));
        assert_eq!(evaluate(-3), Ok(QuantityDecision::Remove));
    }

    #[test]
    fn test_evaluate_above_max_is_refused() {
        assert_eq!(
            evaluate(11),
            Err(QuantityError::OutOfRange { requested: 11 })
        );
        assert_eq!(
            evaluate(1000),
            Err(QuantityError::OutOfRange { requested: 1000 })
        );
    }

    #[test]
    fn test_deserialize_revalidates_bounds() {
        let q: Quantity = serde_json::from_str("3").expect("in bounds");
        assert_eq!(q.get(), 3);
        assert!(serde_json::from_str::<Quantity>("0").is_err());
        assert!(serde_json::from_str::<Quantity>("11").is_err());
    }

    #[test]
    fn test_parse_coerces_text() {
        assert_eq!(
            parse(" 4 "),
            Ok(QuantityDecision::Set(Quantity::new(4).expect("valid")))
        );
        assert_eq!(parse("0"), Ok(QuantityDecision::Remove));
        assert!(matches!(
            parse("a lot"),
            Err(QuantityError::Invalid { .. })
        ));
        assert!(matches!(parse(""), Err(QuantityError::Invalid { .. })));
        assert!(matches!(
            parse("3.5"),
            Err(QuantityError::Invalid { .. })
        ));
    }
}
