//! Status enums for moderated entities.

use serde::{Deserialize, Serialize};

/// Approval state of a vendor application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VendorStatus {
    /// Submitted, waiting for an admin.
    #[default]
    Pending,
    /// Publicly visible shop.
    Approved,
    /// Turned down by an admin; a reason is recorded.
    Rejected,
}

impl VendorStatus {
    /// Wire name, as stored in `vendors.status`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for VendorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VendorStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("invalid vendor status: {s}")),
        }
    }
}

/// Moderation state of a user report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    #[default]
    Open,
    Resolved,
    Dismissed,
}

impl ReportStatus {
    /// Wire name, as stored in `reports.status`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Resolved => "resolved",
            Self::Dismissed => "dismissed",
        }
    }

    /// Only open reports can be closed; closed reports are final.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Open, Self::Resolved | Self::Dismissed)
        )
    }
}

impl std::str::FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "resolved" => Ok(Self::Resolved),
            "dismissed" => Ok(Self::Dismissed),
            _ => Err(format!("invalid report status: {s}")),
        }
    }
}

/// Why a shop or product was reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportReason {
    Spam,
    Inappropriate,
    Fraud,
    Counterfeit,
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&VendorStatus::Approved).ok().as_deref(),
            Some("\"approved\"")
        );
        assert_eq!("rejected".parse(), Ok(VendorStatus::Rejected));
    }

    #[test]
    fn test_report_transitions() {
        assert!(ReportStatus::Open.can_transition_to(ReportStatus::Resolved));
        assert!(ReportStatus::Open.can_transition_to(ReportStatus::Dismissed));
        assert!(!ReportStatus::Resolved.can_transition_to(ReportStatus::Dismissed));
        assert!(!ReportStatus::Dismissed.can_transition_to(ReportStatus::Open));
        assert!(!ReportStatus::Open.can_transition_to(ReportStatus::Open));
    }
}
