//! Profile repository.

use serde_json::json;
use ushop_core::{Role, UserId};

use super::tables::PROFILES;
use crate::models::Profile;
use crate::supabase::{Auth, Filter, SupabaseClient, SupabaseError};

/// Repository for `profiles`.
pub struct ProfileRepository<'a> {
    client: &'a SupabaseClient,
}

impl<'a> ProfileRepository<'a> {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(client: &'a SupabaseClient) -> Self {
        Self { client }
    }

    /// Get a profile by user ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get(&self, id: UserId, auth: Auth<'_>) -> Result<Option<Profile>, SupabaseError> {
        let filter = Filter::new()
            .select("id,email,full_name,role")
            .eq("id", id);
        self.client.select_one(PROFILES, &filter, auth).await
    }

    /// Set a user's role. Service role only.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::NotFound` if the profile does not exist.
    pub async fn set_role(&self, id: UserId, role: Role) -> Result<Profile, SupabaseError> {
        let filter = Filter::new().eq("id", id);
        let rows: Vec<Profile> = self
            .client
            .update(PROFILES, &filter, &json!({ "role": role }), Auth::Service)
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| SupabaseError::NotFound(format!("profile {id}")))
    }
}
