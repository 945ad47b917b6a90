//! Report repository.

use chrono::Utc;
use serde_json::json;
use ushop_core::{ReportId, ReportStatus, UserId};

use super::tables::REPORTS;
use crate::models::{NewReport, Report};
use crate::supabase::{Auth, Filter, SupabaseClient, SupabaseError};

/// Repository for `reports`.
pub struct ReportRepository<'a> {
    client: &'a SupabaseClient,
}

impl<'a> ReportRepository<'a> {
    /// Create a new report repository.
    #[must_use]
    pub const fn new(client: &'a SupabaseClient) -> Self {
        Self { client }
    }

    /// File a report.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn create(&self, report: &NewReport, auth: Auth<'_>) -> Result<Report, SupabaseError> {
        self.client.insert(REPORTS, report, auth).await
    }

    /// Reports in `status`, newest first. Service role only.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list(&self, status: ReportStatus) -> Result<Vec<Report>, SupabaseError> {
        let filter = Filter::new()
            .eq("status", status.as_str())
            .order_desc("created_at");
        self.client.select(REPORTS, &filter, Auth::Service).await
    }

    /// Get one report. Service role only.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get(&self, id: ReportId) -> Result<Option<Report>, SupabaseError> {
        let filter = Filter::new().eq("id", id);
        self.client.select_one(REPORTS, &filter, Auth::Service).await
    }

    /// Close an open report. Returns `None` if it was no longer open.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn close(
        &self,
        id: ReportId,
        to: ReportStatus,
        admin: UserId,
    ) -> Result<Option<Report>, SupabaseError> {
        let filter = Filter::new()
            .eq("id", id)
            .eq("status", ReportStatus::Open.as_str());
        let body = json!({
            "status": to,
            "resolved_at": Utc::now(),
            "resolved_by": admin,
        });
        let rows: Vec<Report> = self
            .client
            .update(REPORTS, &filter, &body, Auth::Service)
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Number of open reports. Service role only.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn count_open(&self) -> Result<u64, SupabaseError> {
        let filter = Filter::new().eq("status", ReportStatus::Open.as_str());
        self.client.count(REPORTS, &filter, Auth::Service).await
    }
}
