//! Shop ratings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ushop_core::{RatingId, Score, UserId, VendorId};

/// A row in `ratings`. One per user and vendor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    pub id: RatingId,
    pub vendor_id: VendorId,
    pub user_id: UserId,
    pub score: Score,
    #[serde(default)]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Upsert body for `ratings` (conflict target `vendor_id,user_id`).
#[derive(Debug, Clone, Serialize)]
pub struct RatingUpsert {
    pub vendor_id: VendorId,
    pub user_id: UserId,
    pub score: Score,
    pub comment: Option<String>,
}

/// Aggregate of a vendor's scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatingSummary {
    pub count: u64,
    /// Mean score rounded to one decimal; `0.0` with no ratings.
    pub average: f64,
    /// Counts for scores 1 through 5.
    pub distribution: [u64; 5],
}

impl RatingSummary {
    /// Summarize a set of scores.
    pub fn from_scores(scores: impl IntoIterator<Item = Score>) -> Self {
        let mut distribution = [0u64; 5];
        for score in scores {
            distribution[usize::from(score.get() - 1)] += 1;
        }
        let count: u64 = distribution.iter().sum();
        let total: u64 = distribution
            .iter()
            .zip(1u64..)
            .map(|(n, score)| n * score)
            .sum();
        #[allow(clippy::cast_precision_loss)]
        let average = if count == 0 {
            0.0
        } else {
            (total as f64 / count as f64 * 10.0).round() / 10.0
        };
        Self {
            count,
            average,
            distribution,
        }
    }

    /// The average, or `None` with no ratings.
    #[must_use]
    pub fn average_if_rated(&self) -> Option<f64> {
        (self.count > 0).then_some(self.average)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn scores(values: &[u8]) -> Vec<Score> {
        values.iter().map(|v| Score::new(i64::from(*v)).unwrap()).collect()
    }

    #[test]
    fn test_empty_summary() {
        let summary = RatingSummary::from_scores(Vec::new());
        assert_eq!(summary.count, 0);
        assert_eq!(summary.average, 0.0);
        assert_eq!(summary.distribution, [0; 5]);
        assert_eq!(summary.average_if_rated(), None);
    }

    #[test]
    fn test_average_rounds_to_one_decimal() {
        // 5 + 4 + 4 = 13 / 3 = 4.333...
        let summary = RatingSummary::from_scores(scores(&[5, 4, 4]));
        assert_eq!(summary.count, 3);
        assert_eq!(summary.average, 4.3);
        assert_eq!(summary.distribution, [0, 0, 0, 2, 1]);
    }

    #[test]
    fn test_average_rounds_half_up() {
        // 5 + 4 = 4.5
        let summary = RatingSummary::from_scores(scores(&[5, 4]));
        assert_eq!(summary.average, 4.5);
        // 1 + 2 + 2 + 2 = 7 / 4 = 1.75 -> 1.8
        let summary = RatingSummary::from_scores(scores(&[1, 2, 2, 2]));
        assert_eq!(summary.average, 1.8);
    }
}
