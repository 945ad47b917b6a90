//! Vendor (shop) rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ushop_core::{CategoryId, UserId, VendorId, VendorStatus};

/// A row in `vendors`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vendor {
    pub id: VendorId,
    pub owner_id: UserId,
    pub business_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
    pub status: VendorStatus,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Vendor {
    /// Whether the public may see this shop.
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.status == VendorStatus::Approved
    }
}

/// Insert body for a vendor application.
#[derive(Debug, Clone, Serialize)]
pub struct NewVendor {
    pub owner_id: UserId,
    pub business_name: String,
    pub description: Option<String>,
    pub category_id: Option<CategoryId>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub status: VendorStatus,
}

/// Owner-editable shop fields. Status and verification are not here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VendorPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
}

impl VendorPatch {
    /// Whether the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.business_name.is_none()
            && self.description.is_none()
            && self.category_id.is_none()
            && self.address.is_none()
            && self.phone.is_none()
            && self.email.is_none()
            && self.logo_url.is_none()
            && self.cover_url.is_none()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_row_deserializes_with_nulls() {
        let json = r#"{
            "id": "5f0c3c84-2a4a-4c56-9f6a-9d2f5d1e7a10",
            "owner_id": "0b6e8f1e-7d2c-4b7a-8d0e-1f2a3b4c5d6e",
            "business_name": "Corner Bakery",
            "description": null,
            "category_id": null,
            "status": "approved",
            "is_verified": true,
            "created_at": "2025-03-01T10:00:00+00:00"
        }"#;
        let vendor: Vendor = serde_json::from_str(json).unwrap();
        assert!(vendor.is_public());
        assert!(vendor.is_verified);
        assert!(vendor.logo_url.is_none());
    }

    #[test]
    fn test_patch_skips_unset_fields() {
        let patch = VendorPatch {
            phone: Some("555-0100".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({ "phone": "555-0100" }));
        assert!(!patch.is_empty());
        assert!(VendorPatch::default().is_empty());
    }
}
