//! Shop rating handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::{info, instrument};
use ushop_core::{Score, VendorId};

use crate::db::{RatingRepository, VendorRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::{Rating, RatingSummary, RatingUpsert, Vendor};
use crate::state::AppState;
use crate::supabase::{Auth, SupabaseClient};

use super::validate::{optional_text, page_limit};

const MAX_COMMENT_CHARS: usize = 1000;
const DEFAULT_PAGE: u32 = 20;
const MAX_PAGE: u32 = 100;

/// Body of `PUT /api/vendors/{id}/ratings`.
#[derive(Debug, Deserialize)]
pub struct RatingInput {
    pub score: i64,
    pub comment: Option<String>,
}

/// Create or replace the caller's rating of a shop.
#[instrument(skip(state, caller, body), fields(user_id = %caller.id()))]
pub async fn upsert(
    State(state): State<AppState>,
    RequireUser(caller): RequireUser,
    Path(vendor_id): Path<VendorId>,
    Json(body): Json<RatingInput>,
) -> Result<Json<Rating>> {
    let score = Score::new(body.score).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let comment = optional_text("comment", body.comment.as_deref(), MAX_COMMENT_CHARS)?;

    let vendor = public_vendor(state.supabase(), vendor_id).await?;
    if vendor.owner_id == caller.id() {
        return Err(AppError::forbidden("You cannot rate your own shop"));
    }

    let rating = RatingRepository::new(state.supabase())
        .upsert(
            &RatingUpsert {
                vendor_id,
                user_id: caller.id(),
                score,
                comment,
            },
            caller.auth(),
        )
        .await?;
    state.search().invalidate_all();
    info!(vendor_id = %vendor_id, score = score.get(), "Rating saved");
    Ok(Json(rating))
}

/// Query string of `GET /api/vendors/{id}/ratings`.
#[derive(Debug, Default, Deserialize)]
pub struct RatingListQuery {
    pub limit: Option<u32>,
}

/// Ratings of a shop, newest first.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Path(vendor_id): Path<VendorId>,
    Query(query): Query<RatingListQuery>,
) -> Result<Json<Vec<Rating>>> {
    public_vendor(state.supabase(), vendor_id).await?;
    let ratings = RatingRepository::new(state.supabase())
        .list_for_vendor(vendor_id, page_limit(query.limit, DEFAULT_PAGE, MAX_PAGE))
        .await?;
    Ok(Json(ratings))
}

/// Count, average and distribution of a shop's ratings.
#[instrument(skip(state))]
pub async fn summary(
    State(state): State<AppState>,
    Path(vendor_id): Path<VendorId>,
) -> Result<Json<RatingSummary>> {
    public_vendor(state.supabase(), vendor_id).await?;
    let scores = RatingRepository::new(state.supabase())
        .scores_for(&[vendor_id])
        .await?;
    Ok(Json(RatingSummary::from_scores(
        scores.into_iter().map(|row| row.score),
    )))
}

/// An approved shop, or 404.
pub(super) async fn public_vendor(client: &SupabaseClient, id: VendorId) -> Result<Vendor> {
    VendorRepository::new(client)
        .get(id, Auth::Anon)
        .await?
        .filter(Vendor::is_public)
        .ok_or_else(|| AppError::NotFound("Shop not found".to_string()))
}
