//! Admin moderation handlers.
//!
//! Every handler requires the admin role. Writes go through
//! [`ModerationService`], which uses the service role.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;
use ushop_core::{ReportId, ReportStatus, VendorId, VendorStatus};

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::{Report, Vendor};
use crate::services::{ModerationService, PlatformStats};
use crate::state::AppState;

// =============================================================================
// Vendors
// =============================================================================

/// Query string of `GET /api/admin/vendors`.
#[derive(Debug, Default, Deserialize)]
pub struct VendorStatusQuery {
    #[serde(default)]
    pub status: VendorStatus,
}

/// Applications in a status (pending by default).
pub async fn vendors(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<VendorStatusQuery>,
) -> Result<Json<Vec<Vendor>>> {
    let vendors = ModerationService::new(state.supabase())
        .list(query.status)
        .await?;
    Ok(Json(vendors))
}

/// Approve a pending application.
#[instrument(skip(state, admin), fields(admin_id = %admin.id()))]
pub async fn approve(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<VendorId>,
) -> Result<Json<Vendor>> {
    let vendor = ModerationService::new(state.supabase()).approve(id).await?;
    state.search().invalidate_all();
    Ok(Json(vendor))
}

/// Body of `POST /api/admin/vendors/{id}/reject`.
#[derive(Debug, Deserialize)]
pub struct RejectInput {
    #[serde(default)]
    pub reason: String,
}

/// Reject a pending application with a reason.
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id()))]
pub async fn reject(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<VendorId>,
    Json(body): Json<RejectInput>,
) -> Result<Json<Vendor>> {
    let vendor = ModerationService::new(state.supabase())
        .reject(id, &body.reason)
        .await?;
    state.search().invalidate_all();
    Ok(Json(vendor))
}

/// Body of `POST /api/admin/vendors/{id}/verify`.
#[derive(Debug, Deserialize)]
pub struct VerifyInput {
    pub verified: bool,
}

/// Grant or remove the verified badge.
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id(), verified = body.verified))]
pub async fn verify(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<VendorId>,
    Json(body): Json<VerifyInput>,
) -> Result<Json<Vendor>> {
    let vendor = ModerationService::new(state.supabase())
        .set_verified(id, body.verified)
        .await?;
    state.search().invalidate_all();
    Ok(Json(vendor))
}

// =============================================================================
// Reports
// =============================================================================

/// Query string of `GET /api/admin/reports`.
#[derive(Debug, Default, Deserialize)]
pub struct ReportStatusQuery {
    #[serde(default)]
    pub status: ReportStatus,
}

/// Reports in a status (open by default), newest first.
pub async fn reports(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<ReportStatusQuery>,
) -> Result<Json<Vec<Report>>> {
    let reports = ModerationService::new(state.supabase())
        .reports(query.status)
        .await?;
    Ok(Json(reports))
}

/// Mark an open report resolved.
#[instrument(skip(state, admin), fields(admin_id = %admin.id()))]
pub async fn resolve_report(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ReportId>,
) -> Result<Json<Report>> {
    let report = ModerationService::new(state.supabase())
        .close_report(id, ReportStatus::Resolved, admin.id())
        .await?;
    Ok(Json(report))
}

/// Dismiss an open report.
#[instrument(skip(state, admin), fields(admin_id = %admin.id()))]
pub async fn dismiss_report(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ReportId>,
) -> Result<Json<Report>> {
    let report = ModerationService::new(state.supabase())
        .close_report(id, ReportStatus::Dismissed, admin.id())
        .await?;
    Ok(Json(report))
}

/// Dashboard counters.
pub async fn stats(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<PlatformStats>> {
    Ok(Json(ModerationService::new(state.supabase()).stats().await?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_queries_default() {
        let vendors: VendorStatusQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(vendors.status, VendorStatus::Pending);
        let reports: ReportStatusQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(reports.status, ReportStatus::Open);
    }

    #[test]
    fn test_reject_without_reason_parses() {
        // The service turns the blank reason into a 400.
        let body: RejectInput = serde_json::from_str("{}").unwrap();
        assert!(body.reason.is_empty());
    }
}
