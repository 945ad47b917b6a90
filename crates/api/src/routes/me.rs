//! Identity and role-gate endpoints.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use ushop_core::{Role, VendorStatus};

use crate::db::VendorRepository;
use crate::error::Result;
use crate::gate::{GateDecision, access_for_path, gate};
use crate::middleware::OptionalUser;
use crate::state::AppState;
use crate::supabase::AuthUser;

/// Response of `GET /api/me`.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: Option<AuthUser>,
    pub role: Option<Role>,
    /// Landing page for the caller's role (`/` when signed out).
    pub home: &'static str,
    pub vendor_status: Option<VendorStatus>,
}

/// Who is calling, with their role and shop status.
#[instrument(skip_all)]
pub async fn me(
    State(state): State<AppState>,
    OptionalUser(caller): OptionalUser,
) -> Result<Json<MeResponse>> {
    let Some(caller) = caller else {
        return Ok(Json(MeResponse {
            user: None,
            role: None,
            home: Role::User.home(),
            vendor_status: None,
        }));
    };

    let vendor = VendorRepository::new(state.supabase())
        .get_by_owner(caller.id(), caller.auth())
        .await?;

    Ok(Json(MeResponse {
        home: caller.role.home(),
        role: Some(caller.role),
        vendor_status: vendor.map(|v| v.status),
        user: Some(caller.user),
    }))
}

/// Query string of `GET /api/gate`.
#[derive(Debug, Deserialize)]
pub struct GateQuery {
    pub path: String,
}

/// Response of `GET /api/gate`.
#[derive(Debug, Serialize)]
pub struct GateResponse {
    pub path: String,
    #[serde(flatten)]
    pub decision: GateDecision,
}

/// Evaluate the role gate for a SPA page.
pub async fn check_gate(
    OptionalUser(caller): OptionalUser,
    Query(query): Query<GateQuery>,
) -> Json<GateResponse> {
    let decision = gate(
        access_for_path(&query.path),
        caller.as_ref().map(|c| c.role),
    );
    Json(GateResponse {
        path: query.path,
        decision,
    })
}
