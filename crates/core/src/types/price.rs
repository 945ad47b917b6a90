//! Listing price ranges using decimal arithmetic.
//!
//! Local shops often quote "from 10 to 25" instead of a single price, so a
//! product carries a minimum and an optional maximum.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Largest accepted price bound (one billion).
pub const MAX_PRICE: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Errors that can occur when building a [`PriceRange`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceRangeError {
    /// The minimum is below zero.
    #[error("price cannot be negative")]
    Negative,
    /// A bound is above [`MAX_PRICE`].
    #[error("price cannot exceed 1000000000")]
    TooLarge,
    /// The maximum is below the minimum.
    #[error("maximum price {max} is below minimum price {min}")]
    Inverted {
        /// Requested minimum.
        min: Decimal,
        /// Requested maximum.
        max: Decimal,
    },
}

/// A validated price range.
///
/// ## Constraints
///
/// - `min >= 0`
/// - `max >= min` when present
/// - both bounds at most [`MAX_PRICE`]
///
/// ## Examples
///
/// ```
/// use rust_decimal::Decimal;
/// use ushop_core::PriceRange;
///
/// let range = PriceRange::new(Decimal::new(1000, 2), Some(Decimal::new(2500, 2))).unwrap();
/// assert_eq!(range.display(), "$10.00 - $25.00");
///
/// assert!(PriceRange::new(Decimal::new(5, 0), Some(Decimal::new(1, 0))).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPriceRange")]
pub struct PriceRange {
    min: Decimal,
    max: Option<Decimal>,
}

#[derive(Deserialize)]
struct RawPriceRange {
    min: Decimal,
    #[serde(default)]
    max: Option<Decimal>,
}

impl TryFrom<RawPriceRange> for PriceRange {
    type Error = PriceRangeError;

    fn try_from(raw: RawPriceRange) -> Result<Self, Self::Error> {
        Self::new(raw.min, raw.max)
    }
}

impl PriceRange {
    /// Build a price range.
    ///
    /// A maximum equal to the minimum is collapsed to a single price.
    ///
    /// # Errors
    ///
    /// Returns an error if `min` is negative, a bound exceeds [`MAX_PRICE`],
    /// or `max < min`.
    pub fn new(min: Decimal, max: Option<Decimal>) -> Result<Self, PriceRangeError> {
        if min.is_sign_negative() && !min.is_zero() {
            return Err(PriceRangeError::Negative);
        }
        if min > MAX_PRICE || max.is_some_and(|m| m > MAX_PRICE) {
            return Err(PriceRangeError::TooLarge);
        }
        if let Some(max) = max
            && max < min
        {
            return Err(PriceRangeError::Inverted { min, max });
        }
        let max = max.filter(|m| *m != min);
        Ok(Self { min, max })
    }

    /// Build a range from stored values without failing.
    ///
    /// Bounds clamp to `0..=MAX_PRICE` and an inverted maximum is dropped.
    /// Used for rows that predate validation.
    #[must_use]
    pub fn lenient(min: Decimal, max: Option<Decimal>) -> Self {
        let min = min.clamp(Decimal::ZERO, MAX_PRICE);
        let max = max.map(|m| m.min(MAX_PRICE)).filter(|m| *m > min);
        Self { min, max }
    }

    /// A single fixed price.
    ///
    /// # Errors
    ///
    /// Returns an error if `price` is negative.
    pub fn fixed(price: Decimal) -> Result<Self, PriceRangeError> {
        Self::new(price, None)
    }

    /// Lower bound.
    #[must_use]
    pub const fn min(&self) -> Decimal {
        self.min
    }

    /// Upper bound, if the listing quotes a range.
    #[must_use]
    pub const fn max(&self) -> Option<Decimal> {
        self.max
    }

    /// Upper bound, or the minimum when there is no range.
    #[must_use]
    pub fn upper(&self) -> Decimal {
        self.max.unwrap_or(self.min)
    }

    /// Value used when sorting by price.
    #[must_use]
    pub fn midpoint(&self) -> Decimal {
        self.max
            .map_or(self.min, |max| self.min + (max - self.min) / Decimal::TWO)
    }

    /// Whether the range intersects `[lo, hi]`. Open bounds are `None`.
    #[must_use]
    pub fn overlaps(&self, lo: Option<Decimal>, hi: Option<Decimal>) -> bool {
        lo.is_none_or(|lo| self.upper() >= lo) && hi.is_none_or(|hi| self.min <= hi)
    }

    /// Format for display (e.g., `"$10.00"` or `"$10.00 - $25.00"`).
    #[must_use]
    pub fn display(&self) -> String {
        match self.max {
            Some(max) => format!("${:.2} - ${:.2}", self.min, max),
            None => format!("${:.2}", self.min),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn d(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    #[test]
    fn test_negative_min_rejected() {
        assert_eq!(PriceRange::new(d(-1), None), Err(PriceRangeError::Negative));
    }

    #[test]
    fn test_inverted_range_rejected() {
        assert!(matches!(
            PriceRange::new(d(2000), Some(d(1000))),
            Err(PriceRangeError::Inverted { .. })
        ));
    }

    #[test]
    fn test_equal_bounds_collapse() {
        let range = PriceRange::new(d(1500), Some(d(1500))).unwrap();
        assert_eq!(range.max(), None);
        assert_eq!(range.display(), "$15.00");
    }

    #[test]
    fn test_lenient_repairs_bad_rows() {
        let range = PriceRange::lenient(d(-500), Some(d(-100)));
        assert_eq!(range.min(), Decimal::ZERO);
        assert_eq!(range.max(), None);

        let range = PriceRange::lenient(d(900), Some(d(100)));
        assert_eq!(range.display(), "$9.00");
    }

    #[test]
    fn test_midpoint() {
        let range = PriceRange::new(d(1000), Some(d(2000))).unwrap();
        assert_eq!(range.midpoint(), d(1500));
        assert_eq!(PriceRange::fixed(d(700)).unwrap().midpoint(), d(700));
    }

    #[test]
    fn test_bounds_above_cap_rejected() {
        let huge = Decimal::from_parts(5, 0, 0, false, 0) * Decimal::from(10_u64.pow(18));
        assert_eq!(PriceRange::new(huge, None), Err(PriceRangeError::TooLarge));
        assert_eq!(
            PriceRange::new(d(100), Some(Decimal::MAX)),
            Err(PriceRangeError::TooLarge)
        );
        assert!(PriceRange::new(MAX_PRICE, None).is_ok());
    }

    #[test]
    fn test_lenient_clamps_huge_rows() {
        let range = PriceRange::lenient(Decimal::MAX, Some(Decimal::MAX));
        assert_eq!(range.min(), MAX_PRICE);
        assert_eq!(range.max(), None);

        let wide = PriceRange::lenient(Decimal::ZERO, Some(Decimal::MAX));
        assert_eq!(wide.upper(), MAX_PRICE);
        assert_eq!(wide.midpoint(), MAX_PRICE / Decimal::TWO);
    }

    #[test]
    fn test_midpoint_at_extremes() {
        let range = PriceRange::new(MAX_PRICE - d(200), Some(MAX_PRICE)).unwrap();
        assert_eq!(range.midpoint(), MAX_PRICE - d(100));
    }

    #[test]
    fn test_overlaps() {
        let range = PriceRange::new(d(1000), Some(d(2000))).unwrap();
        assert!(range.overlaps(Some(d(1500)), None));
        assert!(range.overlaps(None, Some(d(1000))));
        assert!(!range.overlaps(Some(d(2001)), None));
        assert!(!range.overlaps(None, Some(d(999))));
        assert!(range.overlaps(None, None));
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: PriceRange = serde_json::from_str(r#"{"min": "5.00", "max": "9.50"}"#).unwrap();
        assert_eq!(ok.display(), "$5.00 - $9.50");

        let bad = serde_json::from_str::<PriceRange>(r#"{"min": "9.00", "max": "5.00"}"#);
        assert!(bad.is_err());
    }
}
