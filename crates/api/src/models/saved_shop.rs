//! Shops a user bookmarked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ushop_core::{SavedShopId, UserId, VendorId};

use super::Vendor;

/// A row in `saved_shops`, optionally with the embedded vendor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedShop {
    pub id: SavedShopId,
    pub user_id: UserId,
    pub vendor_id: VendorId,
    pub created_at: DateTime<Utc>,
    #[serde(default, rename = "vendors", skip_serializing_if = "Option::is_none")]
    pub vendor: Option<Vendor>,
}
