//! Dashboard analytics for a single vendor.
//!
//! Shops are small, so everything is aggregated in memory from a handful of
//! queries.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;
use ushop_core::CategoryId;

use crate::db::{CategoryRepository, ProductRepository, RatingRepository, SavedShopRepository};
use crate::middleware::Caller;
use crate::models::{Category, Product, Rating, RatingSummary, Vendor};
use crate::supabase::{SupabaseClient, SupabaseError};

const RECENT_RATINGS: u32 = 5;

/// Product counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProductTotals {
    pub total: usize,
    pub available: usize,
}

/// Price spread across the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceStats {
    /// Lowest minimum price.
    pub min: Decimal,
    /// Highest upper price.
    pub max: Decimal,
    /// Mean of the range midpoints, to the cent.
    pub mean: Decimal,
}

/// Products in one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category_id: Option<CategoryId>,
    /// `None` for uncategorized products.
    pub name: Option<String>,
    pub count: usize,
}

/// Response of `GET /api/vendors/me/analytics`.
#[derive(Debug, Clone, Serialize)]
pub struct VendorAnalytics {
    pub products: ProductTotals,
    pub prices: Option<PriceStats>,
    pub categories: Vec<CategoryCount>,
    pub ratings: RatingSummary,
    pub saved_count: u64,
    pub recent_ratings: Vec<Rating>,
}

/// Gather analytics for the caller's shop.
///
/// # Errors
///
/// Returns an error if any query fails.
#[instrument(skip_all, fields(vendor_id = %vendor.id))]
pub async fn vendor_analytics(
    client: &SupabaseClient,
    caller: &Caller,
    vendor: &Vendor,
) -> Result<VendorAnalytics, SupabaseError> {
    let products_repo = ProductRepository::new(client);
    let ratings_repo = RatingRepository::new(client);
    let categories_repo = CategoryRepository::new(client);
    let saved_repo = SavedShopRepository::new(client);
    let vendor_ids = [vendor.id];

    let (products, scores, recent_ratings, categories, saved_count) = tokio::try_join!(
        products_repo.list_for_vendor(vendor.id, caller.auth()),
        ratings_repo.scores_for(&vendor_ids),
        ratings_repo.list_for_vendor(vendor.id, RECENT_RATINGS),
        categories_repo.list(),
        saved_repo.count_for_vendor(vendor.id),
    )?;

    Ok(VendorAnalytics {
        products: product_totals(&products),
        prices: price_stats(&products),
        categories: category_counts(&products, &categories),
        ratings: RatingSummary::from_scores(scores.into_iter().map(|row| row.score)),
        saved_count,
        recent_ratings,
    })
}

fn product_totals(products: &[Product]) -> ProductTotals {
    ProductTotals {
        total: products.len(),
        available: products.iter().filter(|p| p.is_available).count(),
    }
}

fn price_stats(products: &[Product]) -> Option<PriceStats> {
    let prices: Vec<_> = products.iter().map(Product::price).collect();
    let min = prices.iter().map(|p| p.min()).min()?;
    let max = prices.iter().map(|p| p.upper()).max()?;
    let sum: Decimal = prices.iter().map(|p| p.midpoint()).sum();
    let mean = (sum / Decimal::from(prices.len())).round_dp(2);
    Some(PriceStats { min, max, mean })
}

/// Counts per category, largest first, uncategorized last.
fn category_counts(products: &[Product], categories: &[Category]) -> Vec<CategoryCount> {
    let mut counts: HashMap<Option<CategoryId>, usize> = HashMap::new();
    for product in products {
        *counts.entry(product.category_id).or_default() += 1;
    }
    let names: HashMap<CategoryId, &str> =
        categories.iter().map(|c| (c.id, c.name.as_str())).collect();

    let mut rows: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(category_id, count)| CategoryCount {
            category_id,
            name: category_id
                .and_then(|id| names.get(&id))
                .map(|name| (*name).to_string()),
            count,
        })
        .collect();
    rows.sort_by(|a, b| {
        a.category_id
            .is_none()
            .cmp(&b.category_id.is_none())
            .then_with(|| b.count.cmp(&a.count))
            .then_with(|| a.name.cmp(&b.name))
    });
    rows
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use ushop_core::{ProductId, VendorId};

    use super::*;

    fn product(min: i64, max: Option<i64>, category: Option<CategoryId>, available: bool) -> Product {
        Product {
            id: ProductId::random(),
            vendor_id: VendorId::random(),
            name: "p".to_string(),
            description: None,
            price_min: Decimal::new(min, 0),
            price_max: max.map(|m| Decimal::new(m, 0)),
            images: Vec::new(),
            category_id: category,
            is_available: available,
            created_at: Utc::now(),
            updated_at: None,
            vendor: None,
        }
    }

    #[test]
    fn test_totals() {
        let products = vec![product(1, None, None, true), product(2, None, None, false)];
        assert_eq!(
            product_totals(&products),
            ProductTotals {
                total: 2,
                available: 1
            }
        );
    }

    #[test]
    fn test_price_stats() {
        assert_eq!(price_stats(&[]), None);

        let products = vec![
            product(10, Some(20), None, true), // midpoint 15
            product(5, None, None, true),      // 5
            product(30, Some(40), None, true), // 35
        ];
        let stats = price_stats(&products);
        assert_eq!(
            stats,
            Some(PriceStats {
                min: Decimal::new(5, 0),
                max: Decimal::new(40, 0),
                mean: Decimal::new(1833, 2),
            })
        );
    }

    #[test]
    fn test_category_counts() {
        let bakery = Category {
            id: CategoryId::random(),
            name: "Bakery".to_string(),
            slug: "bakery".to_string(),
        };
        let dairy = Category {
            id: CategoryId::random(),
            name: "Dairy".to_string(),
            slug: "dairy".to_string(),
        };
        let products = vec![
            product(1, None, None, true),
            product(1, None, Some(dairy.id), true),
            product(1, None, Some(bakery.id), true),
            product(1, None, Some(bakery.id), true),
        ];
        let rows = category_counts(&products, &[bakery.clone(), dairy.clone()]);
        let summary: Vec<(Option<&str>, usize)> =
            rows.iter().map(|r| (r.name.as_deref(), r.count)).collect();
        assert_eq!(
            summary,
            vec![(Some("Bakery"), 2), (Some("Dairy"), 1), (None, 1)]
        );
    }
}
