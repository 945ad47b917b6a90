//! Star rating score.

use serde::{Deserialize, Serialize};

/// Error returned for out-of-range scores.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("rating must be between 1 and 5 (got {0})")]
pub struct ScoreError(pub i64);

/// A star rating from 1 to 5 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Score(u8);

impl Score {
    /// Lowest score.
    pub const MIN: u8 = 1;
    /// Highest score.
    pub const MAX: u8 = 5;

    /// Validate a score.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreError`] unless `1 <= value <= 5`.
    pub fn new(value: i64) -> Result<Self, ScoreError> {
        u8::try_from(value)
            .ok()
            .filter(|v| (Self::MIN..=Self::MAX).contains(v))
            .map(Self)
            .ok_or(ScoreError(value))
    }

    /// The score as a number.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Score {
    type Error = ScoreError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> Self {
        score.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert!(Score::new(0).is_err());
        assert!(Score::new(6).is_err());
        assert!(Score::new(-3).is_err());
        assert_eq!(Score::new(1).map(Score::get), Ok(1));
        assert_eq!(Score::new(5).map(Score::get), Ok(5));
    }

    #[test]
    fn test_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<Score>("4").is_ok());
        assert!(serde_json::from_str::<Score>("9").is_err());
    }
}
