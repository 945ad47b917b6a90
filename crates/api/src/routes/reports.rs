//! Abuse report submission.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::Deserialize;
use tracing::{info, instrument};
use ushop_core::{ProductId, ReportReason, ReportStatus, VendorId};

use crate::db::{ProductRepository, ReportRepository, VendorRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::{NewReport, Report};
use crate::state::AppState;
use crate::supabase::Auth;

use super::validate::optional_text;

const MAX_DETAILS_CHARS: usize = 1000;

/// Body of `POST /api/reports`.
#[derive(Debug, Deserialize)]
pub struct ReportInput {
    pub vendor_id: VendorId,
    pub product_id: Option<ProductId>,
    pub reason: ReportReason,
    pub details: Option<String>,
}

/// Report a shop, or one of its products.
#[instrument(skip(state, caller, body), fields(user_id = %caller.id(), vendor_id = %body.vendor_id))]
pub async fn create(
    State(state): State<AppState>,
    RequireUser(caller): RequireUser,
    Json(body): Json<ReportInput>,
) -> Result<(StatusCode, Json<Report>)> {
    let details = optional_text("details", body.details.as_deref(), MAX_DETAILS_CHARS)?;

    VendorRepository::new(state.supabase())
        .get(body.vendor_id, Auth::Service)
        .await?
        .ok_or_else(|| AppError::NotFound("Shop not found".to_string()))?;

    if let Some(product_id) = body.product_id {
        ProductRepository::new(state.supabase())
            .get_owned(product_id, body.vendor_id, Auth::Service)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
    }

    let report = ReportRepository::new(state.supabase())
        .create(
            &NewReport {
                reporter_id: caller.id(),
                vendor_id: body.vendor_id,
                product_id: body.product_id,
                reason: body.reason,
                details,
                status: ReportStatus::Open,
            },
            caller.auth(),
        )
        .await?;
    info!(report_id = %report.id, reason = ?report.reason, "Report submitted");
    Ok((StatusCode::CREATED, Json(report)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_report_input_reason_wire_names() {
        let input: ReportInput = serde_json::from_str(
            r#"{"vendor_id": "5f0c3c84-2a4a-4c56-9f6a-9d2f5d1e7a10", "reason": "counterfeit"}"#,
        )
        .unwrap();
        assert_eq!(input.reason, ReportReason::Counterfeit);
        assert!(input.product_id.is_none());

        let unknown = serde_json::from_str::<ReportInput>(
            r#"{"vendor_id": "5f0c3c84-2a4a-4c56-9f6a-9d2f5d1e7a10", "reason": "boring"}"#,
        );
        assert!(unknown.is_err());
    }
}
