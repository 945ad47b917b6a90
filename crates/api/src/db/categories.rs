//! Category repository.

use super::tables::CATEGORIES;
use crate::models::{Category, NewCategory};
use crate::supabase::{Auth, Filter, SupabaseClient, SupabaseError};

/// Repository for `categories`.
pub struct CategoryRepository<'a> {
    client: &'a SupabaseClient,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(client: &'a SupabaseClient) -> Self {
        Self { client }
    }

    /// All categories, alphabetical.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list(&self) -> Result<Vec<Category>, SupabaseError> {
        let filter = Filter::new().select("id,name,slug").order_asc("name");
        self.client.select(CATEGORIES, &filter, Auth::Anon).await
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::Conflict` if the slug already exists.
    pub async fn create(&self, category: &NewCategory) -> Result<Category, SupabaseError> {
        self.client
            .insert(CATEGORIES, category, Auth::Service)
            .await
    }
}
