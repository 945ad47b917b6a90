//! Saved-shop repository.

use serde_json::json;
use ushop_core::{UserId, VendorId};

use super::tables::SAVED_SHOPS;
use crate::models::SavedShop;
use crate::supabase::{Auth, Filter, SupabaseClient, SupabaseError};

/// Repository for `saved_shops`.
pub struct SavedShopRepository<'a> {
    client: &'a SupabaseClient,
}

impl<'a> SavedShopRepository<'a> {
    /// Create a new saved-shop repository.
    #[must_use]
    pub const fn new(client: &'a SupabaseClient) -> Self {
        Self { client }
    }

    /// Bookmark a vendor. Saving twice keeps one row.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn save(
        &self,
        user: UserId,
        vendor: VendorId,
        auth: Auth<'_>,
    ) -> Result<SavedShop, SupabaseError> {
        let row = json!({ "user_id": user, "vendor_id": vendor });
        self.client
            .upsert(SAVED_SHOPS, &row, "user_id,vendor_id", auth)
            .await
    }

    /// Remove a bookmark. Removing a missing bookmark is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn unsave(
        &self,
        user: UserId,
        vendor: VendorId,
        auth: Auth<'_>,
    ) -> Result<(), SupabaseError> {
        let filter = Filter::new().eq("user_id", user).eq("vendor_id", vendor);
        self.client.delete(SAVED_SHOPS, &filter, auth).await
    }

    /// A user's bookmarks with the vendor embedded, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_for_user(
        &self,
        user: UserId,
        auth: Auth<'_>,
    ) -> Result<Vec<SavedShop>, SupabaseError> {
        let filter = Filter::new()
            .select("*,vendors(*)")
            .eq("user_id", user)
            .order_desc("created_at");
        self.client.select(SAVED_SHOPS, &filter, auth).await
    }

    /// How many users saved `vendor`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn count_for_vendor(&self, vendor: VendorId) -> Result<u64, SupabaseError> {
        let filter = Filter::new().eq("vendor_id", vendor);
        self.client.count(SAVED_SHOPS, &filter, Auth::Service).await
    }
}
