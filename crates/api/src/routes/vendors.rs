//! Vendor (shop) route handlers.

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use ushop_core::{CategoryId, Role, VendorId, VendorStatus};
use uuid::Uuid;

use crate::db::{RatingRepository, VendorRepository, VendorSort, buckets};
use crate::error::{AppError, Result};
use crate::middleware::{OptionalUser, RequireUser, RequireVendor};
use crate::models::{NewVendor, RatingSummary, Vendor, VendorPatch};
use crate::search::{VendorHit, vendor_averages};
use crate::services::{VendorAnalytics, vendor_analytics};
use crate::state::AppState;
use crate::supabase::Auth;

use super::upload::read_image;
use super::validate::{optional_email, optional_phone, optional_text, page_limit, required_text};

const DEFAULT_PAGE: u32 = 20;
const MAX_PAGE: u32 = 50;

/// How many shops are ranked when sorting by rating.
const RATING_SORT_WINDOW: u32 = 500;

const BUSINESS_NAME_CHARS: (usize, usize) = (2, 100);
const MAX_DESCRIPTION_CHARS: usize = 2000;
const MAX_ADDRESS_CHARS: usize = 300;

// =============================================================================
// Public listing
// =============================================================================

/// Orderings accepted by the vendor list.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VendorListSort {
    #[default]
    Newest,
    Rating,
    Name,
}

/// Query string of `GET /api/vendors`.
#[derive(Debug, Default, Deserialize)]
pub struct VendorListQuery {
    pub category: Option<CategoryId>,
    #[serde(default)]
    pub sort: VendorListSort,
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: u32,
}

/// Approved shops.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<VendorListQuery>,
) -> Result<Json<Vec<VendorHit>>> {
    let repo = VendorRepository::new(state.supabase());
    let limit = page_limit(query.limit, DEFAULT_PAGE, MAX_PAGE);

    let vendors = match query.sort {
        VendorListSort::Newest => {
            repo.list_public(query.category, VendorSort::Newest, limit, query.offset)
                .await?
        }
        VendorListSort::Name => {
            repo.list_public(query.category, VendorSort::Name, limit, query.offset)
                .await?
        }
        VendorListSort::Rating => {
            repo.list_public(query.category, VendorSort::Name, RATING_SORT_WINDOW, 0)
                .await?
        }
    };

    let mut hits = with_ratings(&state, vendors).await?;
    if matches!(query.sort, VendorListSort::Rating) {
        crate::search::sort_vendors(&mut hits, crate::search::SearchSort::Rating, "");
        hits = hits
            .into_iter()
            .skip(query.offset as usize)
            .take(limit as usize)
            .collect();
    }
    Ok(Json(hits))
}

async fn with_ratings(state: &AppState, vendors: Vec<Vendor>) -> Result<Vec<VendorHit>> {
    let ids: Vec<VendorId> = vendors.iter().map(|v| v.id).collect();
    let scores = RatingRepository::new(state.supabase())
        .scores_for(&ids)
        .await?;
    let averages = vendor_averages(scores.into_iter().map(|row| (row.vendor_id, row.score)));
    Ok(vendors
        .into_iter()
        .map(|vendor| VendorHit {
            average_rating: averages.get(&vendor.id).copied(),
            vendor,
        })
        .collect())
}

/// A shop with its rating summary.
#[derive(Debug, Serialize)]
pub struct VendorDetail {
    #[serde(flatten)]
    pub vendor: Vendor,
    pub ratings: RatingSummary,
}

/// One shop. Unapproved shops are visible to their owner and admins only.
#[instrument(skip(state, caller))]
pub async fn show(
    State(state): State<AppState>,
    OptionalUser(caller): OptionalUser,
    Path(id): Path<VendorId>,
) -> Result<Json<VendorDetail>> {
    let vendor = VendorRepository::new(state.supabase())
        .get(id, Auth::Service)
        .await?
        .filter(|vendor| {
            vendor.is_public()
                || caller
                    .as_ref()
                    .is_some_and(|c| c.role == Role::Admin || c.id() == vendor.owner_id)
        })
        .ok_or_else(|| AppError::NotFound("Shop not found".to_string()))?;

    let scores = RatingRepository::new(state.supabase())
        .scores_for(&[vendor.id])
        .await?;
    Ok(Json(VendorDetail {
        ratings: RatingSummary::from_scores(scores.into_iter().map(|row| row.score)),
        vendor,
    }))
}

// =============================================================================
// Owner endpoints
// =============================================================================

/// Body of `POST /api/vendors`.
#[derive(Debug, Deserialize)]
pub struct VendorApplication {
    pub business_name: String,
    pub description: Option<String>,
    pub category_id: Option<CategoryId>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Apply to open a shop.
#[instrument(skip(state, caller, body), fields(user_id = %caller.id()))]
pub async fn apply(
    State(state): State<AppState>,
    RequireUser(caller): RequireUser,
    Json(body): Json<VendorApplication>,
) -> Result<(StatusCode, Json<Vendor>)> {
    let new_vendor = NewVendor {
        owner_id: caller.id(),
        business_name: required_text(
            "business_name",
            &body.business_name,
            BUSINESS_NAME_CHARS.0,
            BUSINESS_NAME_CHARS.1,
        )?,
        description: optional_text("description", body.description.as_deref(), MAX_DESCRIPTION_CHARS)?,
        category_id: body.category_id,
        address: optional_text("address", body.address.as_deref(), MAX_ADDRESS_CHARS)?,
        phone: optional_phone(body.phone.as_deref())?,
        email: optional_email(body.email.as_deref())?,
        status: VendorStatus::Pending,
    };

    let repo = VendorRepository::new(state.supabase());
    if repo.get_by_owner(caller.id(), caller.auth()).await?.is_some() {
        return Err(already_applied());
    }
    let vendor = repo
        .create(&new_vendor, caller.auth())
        .await
        .map_err(|e| match e {
            crate::supabase::SupabaseError::Conflict(_) => already_applied(),
            other => other.into(),
        })?;

    info!(vendor_id = %vendor.id, "Vendor application submitted");
    Ok((StatusCode::CREATED, Json(vendor)))
}

fn already_applied() -> AppError {
    AppError::Conflict("You already have a shop application".to_string())
}

/// The caller's own shop, in any status.
pub async fn mine(
    State(state): State<AppState>,
    RequireUser(caller): RequireUser,
) -> Result<Json<Vendor>> {
    VendorRepository::new(state.supabase())
        .get_by_owner(caller.id(), caller.auth())
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("You have no shop yet".to_string()))
}

/// Edit the caller's shop.
#[instrument(skip(state, caller, patch), fields(user_id = %caller.id()))]
pub async fn update_mine(
    State(state): State<AppState>,
    RequireUser(caller): RequireUser,
    Json(patch): Json<VendorPatch>,
) -> Result<Json<Vendor>> {
    let patch = VendorPatch {
        business_name: patch
            .business_name
            .as_deref()
            .map(|n| required_text("business_name", n, BUSINESS_NAME_CHARS.0, BUSINESS_NAME_CHARS.1))
            .transpose()?,
        description: optional_text("description", patch.description.as_deref(), MAX_DESCRIPTION_CHARS)?,
        category_id: patch.category_id,
        address: optional_text("address", patch.address.as_deref(), MAX_ADDRESS_CHARS)?,
        phone: optional_phone(patch.phone.as_deref())?,
        email: optional_email(patch.email.as_deref())?,
        // Image URLs are only set through the upload endpoint.
        logo_url: None,
        cover_url: None,
    };
    if patch.is_empty() {
        return Err(AppError::BadRequest("Nothing to update".to_string()));
    }

    let vendor = VendorRepository::new(state.supabase())
        .update_by_owner(caller.id(), &patch, caller.auth())
        .await?;
    state.search().invalidate_all();
    Ok(Json(vendor))
}

/// Query string of `POST /api/vendors/me/logo`.
#[derive(Debug, Default, Deserialize)]
pub struct ImageKindQuery {
    #[serde(default)]
    pub kind: Option<String>,
}

/// Upload a logo (or cover with `?kind=cover`) for the caller's shop.
#[instrument(skip_all, fields(user_id = %caller.id()))]
pub async fn upload_logo(
    State(state): State<AppState>,
    RequireUser(caller): RequireUser,
    Query(query): Query<ImageKindQuery>,
    mut multipart: Multipart,
) -> Result<Json<Vendor>> {
    let is_cover = match query.kind.as_deref() {
        None | Some("logo") => false,
        Some("cover") => true,
        Some(other) => {
            return Err(AppError::BadRequest(format!("unknown image kind: {other}")));
        }
    };

    let repo = VendorRepository::new(state.supabase());
    let vendor = repo
        .get_by_owner(caller.id(), caller.auth())
        .await?
        .ok_or_else(|| AppError::NotFound("You have no shop yet".to_string()))?;

    let image = read_image(&mut multipart).await?;
    let name = if is_cover { "cover" } else { "logo" };
    let path = format!("{}/{name}-{}.{}", vendor.id, Uuid::new_v4(), image.extension);
    let url = state
        .supabase()
        .upload_object(
            buckets::VENDOR_IMAGES,
            &path,
            image.bytes,
            image.content_type,
            caller.auth(),
        )
        .await?;

    let patch = if is_cover {
        VendorPatch {
            cover_url: Some(url),
            ..VendorPatch::default()
        }
    } else {
        VendorPatch {
            logo_url: Some(url),
            ..VendorPatch::default()
        }
    };
    let vendor = repo
        .update_by_owner(caller.id(), &patch, caller.auth())
        .await?;
    state.search().invalidate_all();
    Ok(Json(vendor))
}

/// Dashboard analytics for the caller's approved shop.
pub async fn analytics(
    State(state): State<AppState>,
    RequireVendor { caller, vendor }: RequireVendor,
) -> Result<Json<VendorAnalytics>> {
    Ok(Json(vendor_analytics(state.supabase(), &caller, &vendor).await?))
}
