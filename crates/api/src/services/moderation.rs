//! Admin moderation: vendor applications, verification badges and reports.
//!
//! Shared by the admin API routes and `ushop-cli`. Every write uses the
//! service role and is conditional on the current status, so a decision can
//! only be applied once.

use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};
use ushop_core::{ReportId, ReportStatus, Role, UserId, VendorId, VendorStatus};

use crate::db::{ProductRepository, ProfileRepository, ReportRepository, VendorRepository};
use crate::error::AppError;
use crate::models::{Report, Vendor};
use crate::supabase::{Auth, SupabaseClient, SupabaseError};

/// Longest stored rejection reason, in characters.
pub const MAX_REASON_CHARS: usize = 500;

/// Errors from moderation actions.
#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("Supabase error: {0}")]
    Supabase(#[from] SupabaseError),

    #[error("vendor {0} not found")]
    VendorNotFound(VendorId),

    #[error("vendor is {current}, only pending applications can be {action}")]
    NotPending {
        current: VendorStatus,
        action: &'static str,
    },

    #[error("a rejection reason is required")]
    MissingReason,

    #[error("rejection reason must be at most {MAX_REASON_CHARS} characters")]
    ReasonTooLong,

    #[error("report {0} not found")]
    ReportNotFound(ReportId),

    #[error("report is already {0}")]
    ReportClosed(&'static str),

    #[error("reports can only be resolved or dismissed")]
    InvalidReportStatus,
}

impl From<ModerationError> for AppError {
    fn from(err: ModerationError) -> Self {
        match err {
            ModerationError::Supabase(e) => Self::Supabase(e),
            ModerationError::VendorNotFound(_) | ModerationError::ReportNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            ModerationError::NotPending { .. } | ModerationError::ReportClosed(_) => {
                Self::Conflict(err.to_string())
            }
            ModerationError::MissingReason
            | ModerationError::ReasonTooLong
            | ModerationError::InvalidReportStatus => Self::BadRequest(err.to_string()),
        }
    }
}

/// Platform-wide counters for the admin dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct PlatformStats {
    pub vendors_pending: u64,
    pub vendors_approved: u64,
    pub vendors_rejected: u64,
    pub products: u64,
    pub open_reports: u64,
}

/// Moderation operations over the service-role client.
pub struct ModerationService<'a> {
    client: &'a SupabaseClient,
}

impl<'a> ModerationService<'a> {
    /// Create a new moderation service.
    #[must_use]
    pub const fn new(client: &'a SupabaseClient) -> Self {
        Self { client }
    }

    /// Applications in `status`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list(&self, status: VendorStatus) -> Result<Vec<Vendor>, ModerationError> {
        Ok(VendorRepository::new(self.client)
            .list_by_status(status)
            .await?)
    }

    /// Approve a pending application and give its owner the vendor role.
    ///
    /// Owners who are admins keep the admin role.
    ///
    /// # Errors
    ///
    /// Returns `NotPending` if the application was already decided.
    #[instrument(skip(self))]
    pub async fn approve(&self, id: VendorId) -> Result<Vendor, ModerationError> {
        let current = VendorRepository::new(self.client)
            .get(id, Auth::Service)
            .await?
            .ok_or(ModerationError::VendorNotFound(id))?;
        if current.status != VendorStatus::Pending {
            return Err(ModerationError::NotPending {
                current: current.status,
                action: "approved",
            });
        }
        // Role before status: a failed grant leaves the application pending.
        self.grant_vendor_role(current.owner_id).await?;
        let vendor = self
            .decide(id, VendorStatus::Approved, None, "approved")
            .await?;
        info!(vendor_id = %id, owner_id = %vendor.owner_id, "Vendor approved");
        Ok(vendor)
    }

    /// Reject a pending application with a reason shown to the owner.
    ///
    /// # Errors
    ///
    /// Returns `MissingReason` for a blank reason, or `NotPending` if the
    /// application was already decided.
    #[instrument(skip(self, reason))]
    pub async fn reject(&self, id: VendorId, reason: &str) -> Result<Vendor, ModerationError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ModerationError::MissingReason);
        }
        if reason.chars().count() > MAX_REASON_CHARS {
            return Err(ModerationError::ReasonTooLong);
        }
        let vendor = self
            .decide(id, VendorStatus::Rejected, Some(reason), "rejected")
            .await?;
        info!(vendor_id = %id, "Vendor rejected");
        Ok(vendor)
    }

    /// Set or clear the verified badge.
    ///
    /// # Errors
    ///
    /// Returns `VendorNotFound` if the vendor does not exist.
    pub async fn set_verified(&self, id: VendorId, verified: bool) -> Result<Vendor, ModerationError> {
        VendorRepository::new(self.client)
            .set_verified(id, verified)
            .await
            .map_err(|e| match e {
                SupabaseError::NotFound(_) => ModerationError::VendorNotFound(id),
                other => other.into(),
            })
    }

    /// Reports in `status`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn reports(&self, status: ReportStatus) -> Result<Vec<Report>, ModerationError> {
        Ok(ReportRepository::new(self.client).list(status).await?)
    }

    /// Resolve or dismiss an open report.
    ///
    /// # Errors
    ///
    /// Returns `ReportClosed` if the report is no longer open.
    #[instrument(skip(self))]
    pub async fn close_report(
        &self,
        id: ReportId,
        to: ReportStatus,
        admin: UserId,
    ) -> Result<Report, ModerationError> {
        if !ReportStatus::Open.can_transition_to(to) {
            return Err(ModerationError::InvalidReportStatus);
        }
        let reports = ReportRepository::new(self.client);
        if let Some(report) = reports.close(id, to, admin).await? {
            info!(report_id = %id, status = to.as_str(), "Report closed");
            return Ok(report);
        }
        match reports.get(id).await? {
            Some(report) => Err(ModerationError::ReportClosed(report.status.as_str())),
            None => Err(ModerationError::ReportNotFound(id)),
        }
    }

    /// Dashboard counters.
    ///
    /// # Errors
    ///
    /// Returns an error if any count fails.
    pub async fn stats(&self) -> Result<PlatformStats, ModerationError> {
        let vendors = VendorRepository::new(self.client);
        let products = ProductRepository::new(self.client);
        let reports = ReportRepository::new(self.client);
        let (pending, approved, rejected, products, open_reports) = tokio::try_join!(
            vendors.count_by_status(VendorStatus::Pending),
            vendors.count_by_status(VendorStatus::Approved),
            vendors.count_by_status(VendorStatus::Rejected),
            products.count_all(),
            reports.count_open(),
        )?;
        Ok(PlatformStats {
            vendors_pending: pending,
            vendors_approved: approved,
            vendors_rejected: rejected,
            products,
            open_reports,
        })
    }

    async fn decide(
        &self,
        id: VendorId,
        to: VendorStatus,
        reason: Option<&str>,
        action: &'static str,
    ) -> Result<Vendor, ModerationError> {
        let vendors = VendorRepository::new(self.client);
        if let Some(vendor) = vendors
            .transition(id, VendorStatus::Pending, to, reason)
            .await?
        {
            return Ok(vendor);
        }
        match vendors.get(id, Auth::Service).await? {
            Some(vendor) => Err(ModerationError::NotPending {
                current: vendor.status,
                action,
            }),
            None => Err(ModerationError::VendorNotFound(id)),
        }
    }

    async fn grant_vendor_role(&self, owner: UserId) -> Result<(), ModerationError> {
        let profiles = ProfileRepository::new(self.client);
        match profiles.get(owner, Auth::Service).await? {
            Some(profile) if profile.role() == Role::Admin => Ok(()),
            Some(_) => {
                profiles.set_role(owner, Role::Vendor).await?;
                Ok(())
            }
            None => {
                warn!(owner_id = %owner, "Approved vendor owner has no profile");
                Ok(())
            }
        }
    }
}
