//! Rating repository.

use serde::Deserialize;
use ushop_core::{Score, VendorId};

use super::tables::RATINGS;
use crate::models::{Rating, RatingUpsert};
use crate::supabase::{Auth, Filter, SupabaseClient, SupabaseError};

/// Score-only projection used for aggregates.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ScoreRow {
    pub vendor_id: VendorId,
    pub score: Score,
}

/// Repository for `ratings`.
pub struct RatingRepository<'a> {
    client: &'a SupabaseClient,
}

impl<'a> RatingRepository<'a> {
    /// Create a new rating repository.
    #[must_use]
    pub const fn new(client: &'a SupabaseClient) -> Self {
        Self { client }
    }

    /// Insert or replace the caller's rating of a vendor.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn upsert(&self, rating: &RatingUpsert, auth: Auth<'_>) -> Result<Rating, SupabaseError> {
        self.client
            .upsert(RATINGS, rating, "vendor_id,user_id", auth)
            .await
    }

    /// A vendor's ratings, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_for_vendor(
        &self,
        vendor: VendorId,
        limit: u32,
    ) -> Result<Vec<Rating>, SupabaseError> {
        let filter = Filter::new()
            .eq("vendor_id", vendor)
            .order_desc("created_at")
            .limit(limit);
        self.client.select(RATINGS, &filter, Auth::Anon).await
    }

    /// Every score for the given vendors.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn scores_for(&self, vendors: &[VendorId]) -> Result<Vec<ScoreRow>, SupabaseError> {
        if vendors.is_empty() {
            return Ok(Vec::new());
        }
        let filter = Filter::new()
            .select("vendor_id,score")
            .in_("vendor_id", vendors);
        self.client.select(RATINGS, &filter, Auth::Anon).await
    }
}
