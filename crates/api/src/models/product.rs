//! Product listing rows.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ushop_core::{CategoryId, PriceRange, ProductId, VendorId, VendorStatus};

/// Vendor columns embedded in product selects (`vendors!inner(...)`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorSummary {
    pub id: VendorId,
    pub business_name: String,
    pub status: VendorStatus,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub logo_url: Option<String>,
}

/// A row in `products`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub vendor_id: VendorId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_min: Decimal,
    #[serde(default)]
    pub price_max: Option<Decimal>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default = "default_available")]
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "vendors", skip_serializing_if = "Option::is_none")]
    pub vendor: Option<VendorSummary>,
}

const fn default_available() -> bool {
    true
}

impl Product {
    /// Price range of this listing.
    #[must_use]
    pub fn price(&self) -> PriceRange {
        PriceRange::lenient(self.price_min, self.price_max)
    }
}

/// Insert body for `products`.
#[derive(Debug, Clone, Serialize)]
pub struct NewProduct {
    pub vendor_id: VendorId,
    pub name: String,
    pub description: Option<String>,
    pub price_min: Decimal,
    pub price_max: Option<Decimal>,
    pub images: Vec<String>,
    pub category_id: Option<CategoryId>,
    pub is_available: bool,
}

/// Patch body for `products`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_min: Option<Decimal>,
    /// `Some(None)` clears the maximum.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_max: Option<Option<Decimal>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_with_embedded_vendor() {
        let json = r#"{
            "id": "a3a1f1de-7f0a-4d7e-9d0c-3c3b6f0e1a21",
            "vendor_id": "5f0c3c84-2a4a-4c56-9f6a-9d2f5d1e7a10",
            "name": "Sourdough Loaf",
            "price_min": 6.5,
            "price_max": null,
            "images": ["https://cdn/x.jpg"],
            "created_at": "2025-03-01T10:00:00+00:00",
            "vendors": {
                "id": "5f0c3c84-2a4a-4c56-9f6a-9d2f5d1e7a10",
                "business_name": "Corner Bakery",
                "status": "approved"
            }
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert!(product.is_available);
        assert_eq!(product.price().display(), "$6.50");
        assert_eq!(
            product.vendor.map(|v| v.business_name).as_deref(),
            Some("Corner Bakery")
        );
    }

    #[test]
    fn test_patch_can_clear_max_price() {
        let patch = ProductPatch {
            price_max: Some(None),
            ..Default::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({ "price_max": null }));
    }
}
