//! Vendor repository.

use chrono::Utc;
use serde_json::json;
use ushop_core::{CategoryId, UserId, VendorId, VendorStatus};

use super::tables::VENDORS;
use crate::models::{NewVendor, Vendor, VendorPatch};
use crate::supabase::{Auth, Filter, SupabaseClient, SupabaseError};

/// Database-side orderings for vendor lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VendorSort {
    #[default]
    Newest,
    Name,
}

/// Repository for `vendors`.
pub struct VendorRepository<'a> {
    client: &'a SupabaseClient,
}

impl<'a> VendorRepository<'a> {
    /// Create a new vendor repository.
    #[must_use]
    pub const fn new(client: &'a SupabaseClient) -> Self {
        Self { client }
    }

    /// Approved vendors, optionally in one category.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_public(
        &self,
        category: Option<CategoryId>,
        sort: VendorSort,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Vendor>, SupabaseError> {
        let mut filter = Filter::new().eq("status", VendorStatus::Approved);
        if let Some(category) = category {
            filter = filter.eq("category_id", category);
        }
        filter = match sort {
            VendorSort::Newest => filter.order_desc("created_at"),
            VendorSort::Name => filter.order_asc("business_name"),
        };
        let filter = filter.order_asc("id").limit(limit).offset(offset);
        self.client.select(VENDORS, &filter, Auth::Anon).await
    }

    /// Get a vendor regardless of status.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get(&self, id: VendorId, auth: Auth<'_>) -> Result<Option<Vendor>, SupabaseError> {
        let filter = Filter::new().eq("id", id);
        self.client.select_one(VENDORS, &filter, auth).await
    }

    /// Get several vendors by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get_many(
        &self,
        ids: &[VendorId],
        auth: Auth<'_>,
    ) -> Result<Vec<Vendor>, SupabaseError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let filter = Filter::new().in_("id", ids);
        self.client.select(VENDORS, &filter, auth).await
    }

    /// The vendor owned by `owner`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get_by_owner(
        &self,
        owner: UserId,
        auth: Auth<'_>,
    ) -> Result<Option<Vendor>, SupabaseError> {
        let filter = Filter::new().eq("owner_id", owner);
        self.client.select_one(VENDORS, &filter, auth).await
    }

    /// Insert a vendor application.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::Conflict` if the owner already has a vendor.
    pub async fn create(&self, vendor: &NewVendor, auth: Auth<'_>) -> Result<Vendor, SupabaseError> {
        self.client.insert(VENDORS, vendor, auth).await
    }

    /// Apply an owner's edit.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::NotFound` if the owner has no vendor.
    pub async fn update_by_owner(
        &self,
        owner: UserId,
        patch: &VendorPatch,
        auth: Auth<'_>,
    ) -> Result<Vendor, SupabaseError> {
        let filter = Filter::new().eq("owner_id", owner);
        let mut body = serde_json::to_value(patch)?;
        if let Some(map) = body.as_object_mut() {
            map.insert("updated_at".to_string(), json!(Utc::now()));
        }
        let rows: Vec<Vendor> = self.client.update(VENDORS, &filter, &body, auth).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| SupabaseError::NotFound(format!("vendor for owner {owner}")))
    }

    /// Applications in a given status, oldest first. Service role only.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_by_status(&self, status: VendorStatus) -> Result<Vec<Vendor>, SupabaseError> {
        let filter = Filter::new()
            .eq("status", status)
            .order_asc("created_at");
        self.client.select(VENDORS, &filter, Auth::Service).await
    }

    /// Move a vendor from `from` to `to`, recording `reason` for rejections.
    ///
    /// The update is conditional on the current status, so two admins acting
    /// at once cannot both succeed. Returns `None` when the vendor was not in
    /// `from`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn transition(
        &self,
        id: VendorId,
        from: VendorStatus,
        to: VendorStatus,
        reason: Option<&str>,
    ) -> Result<Option<Vendor>, SupabaseError> {
        let filter = Filter::new().eq("id", id).eq("status", from);
        let body = json!({
            "status": to,
            "rejection_reason": reason,
            "updated_at": Utc::now(),
        });
        let rows: Vec<Vendor> = self
            .client
            .update(VENDORS, &filter, &body, Auth::Service)
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Set the verified badge. Service role only.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::NotFound` if the vendor does not exist.
    pub async fn set_verified(&self, id: VendorId, verified: bool) -> Result<Vendor, SupabaseError> {
        let filter = Filter::new().eq("id", id);
        let body = json!({ "is_verified": verified, "updated_at": Utc::now() });
        let rows: Vec<Vendor> = self
            .client
            .update(VENDORS, &filter, &body, Auth::Service)
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| SupabaseError::NotFound(format!("vendor {id}")))
    }

    /// Approved vendors whose name or description contains `term`, newest first.
    ///
    /// At most `window` rows come back; callers rank and trim them.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn search(
        &self,
        term: &str,
        category: Option<CategoryId>,
        window: u32,
    ) -> Result<Vec<Vendor>, SupabaseError> {
        let mut filter = Filter::new()
            .eq("status", VendorStatus::Approved)
            .or_ilike(&["business_name", "description"], term);
        if let Some(category) = category {
            filter = filter.eq("category_id", category);
        }
        let filter = filter.order_desc("created_at").limit(window);
        self.client.select(VENDORS, &filter, Auth::Anon).await
    }

    /// Number of vendors in `status`. Service role only.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn count_by_status(&self, status: VendorStatus) -> Result<u64, SupabaseError> {
        let filter = Filter::new().eq("status", status);
        self.client.count(VENDORS, &filter, Auth::Service).await
    }
}
