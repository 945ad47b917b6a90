//! Abuse reports against shops and products.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ushop_core::{ProductId, ReportId, ReportReason, ReportStatus, UserId, VendorId};

/// A row in `reports`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub reporter_id: UserId,
    pub vendor_id: VendorId,
    #[serde(default)]
    pub product_id: Option<ProductId>,
    pub reason: ReportReason,
    #[serde(default)]
    pub details: Option<String>,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolved_by: Option<UserId>,
}

/// Insert body for `reports`.
#[derive(Debug, Clone, Serialize)]
pub struct NewReport {
    pub reporter_id: UserId,
    pub vendor_id: VendorId,
    pub product_id: Option<ProductId>,
    pub reason: ReportReason,
    pub details: Option<String>,
    pub status: ReportStatus,
}
