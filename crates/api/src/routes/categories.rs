//! Category handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::db::CategoryRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{Category, NewCategory, slugify};
use crate::state::{AppState, CATEGORIES_KEY};
use crate::supabase::SupabaseError;

use super::validate::{optional_text, required_text};

const NAME_CHARS: (usize, usize) = (2, 60);
const MAX_SLUG_CHARS: usize = 60;

/// All categories, alphabetical. Served from the in-process cache.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Response> {
    let supabase = state.supabase().clone();
    let categories = state
        .categories()
        .try_get_with(CATEGORIES_KEY, async move {
            CategoryRepository::new(&supabase).list().await.map(Arc::new)
        })
        .await
        .map_err(|e: Arc<SupabaseError>| {
            AppError::Internal(format!("failed to load categories: {e}"))
        })?;
    Ok(Json(categories.as_slice()).into_response())
}

/// Body of `POST /api/admin/categories`.
#[derive(Debug, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    pub slug: Option<String>,
}

/// Create a category. The slug is derived from the name when absent.
#[instrument(skip(state, admin), fields(admin_id = %admin.id()))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(body): Json<CategoryInput>,
) -> Result<(StatusCode, Json<Category>)> {
    let category = NewCategory::from_input(&body)?;
    let created = CategoryRepository::new(state.supabase())
        .create(&category)
        .await
        .map_err(|e| match e {
            SupabaseError::Conflict(_) => {
                AppError::Conflict(format!("A category with slug {} already exists", category.slug))
            }
            other => other.into(),
        })?;

    state.categories().invalidate(CATEGORIES_KEY).await;
    info!(slug = %created.slug, "Category created");
    Ok((StatusCode::CREATED, Json(created)))
}

impl NewCategory {
    fn from_input(input: &CategoryInput) -> Result<Self> {
        let name = required_text("name", &input.name, NAME_CHARS.0, NAME_CHARS.1)?;
        let slug = optional_text("slug", input.slug.as_deref(), MAX_SLUG_CHARS)?
            .map_or_else(|| slugify(&name), |s| slugify(&s));
        if slug.is_empty() {
            return Err(AppError::BadRequest(
                "slug must contain at least one letter or digit".to_string(),
            ));
        }
        Ok(Self { name, slug })
    }
}
