//! Saved-shop handlers. Save and unsave are idempotent.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;
use ushop_core::VendorId;

use crate::db::SavedShopRepository;
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::SavedShop;
use crate::state::AppState;

use super::ratings::public_vendor;

/// The caller's saved shops, newest first.
pub async fn index(
    State(state): State<AppState>,
    RequireUser(caller): RequireUser,
) -> Result<Json<Vec<SavedShop>>> {
    let saved = SavedShopRepository::new(state.supabase())
        .list_for_user(caller.id(), caller.auth())
        .await?;
    Ok(Json(saved))
}

/// Bookmark a shop.
#[instrument(skip(state, caller), fields(user_id = %caller.id()))]
pub async fn save(
    State(state): State<AppState>,
    RequireUser(caller): RequireUser,
    Path(vendor_id): Path<VendorId>,
) -> Result<Json<SavedShop>> {
    public_vendor(state.supabase(), vendor_id).await?;
    let saved = SavedShopRepository::new(state.supabase())
        .save(caller.id(), vendor_id, caller.auth())
        .await?;
    Ok(Json(saved))
}

/// Remove a bookmark. Unsaving a shop that was never saved succeeds.
#[instrument(skip(state, caller), fields(user_id = %caller.id()))]
pub async fn unsave(
    State(state): State<AppState>,
    RequireUser(caller): RequireUser,
    Path(vendor_id): Path<VendorId>,
) -> Result<StatusCode> {
    SavedShopRepository::new(state.supabase())
        .unsave(caller.id(), vendor_id, caller.auth())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
