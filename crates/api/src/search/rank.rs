//! Query normalization and in-memory ordering of search hits.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::{Product, Vendor};

/// Longest query kept after normalization, in characters.
pub const MAX_QUERY_CHARS: usize = 100;

/// Shortest query that reaches the database, in characters.
pub const MIN_QUERY_CHARS: usize = 2;

/// Result ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchSort {
    /// Exact name, then prefix, then substring, then description-only.
    #[default]
    Relevance,
    PriceAsc,
    PriceDesc,
    /// Highest vendor average first; unrated last.
    Rating,
    Newest,
}

/// A matching shop with its rating average.
#[derive(Debug, Clone, Serialize)]
pub struct VendorHit {
    #[serde(flatten)]
    pub vendor: Vendor,
    pub average_rating: Option<f64>,
}

/// A matching product with its vendor's rating average.
#[derive(Debug, Clone, Serialize)]
pub struct ProductHit {
    #[serde(flatten)]
    pub product: Product,
    pub vendor_rating: Option<f64>,
}

/// Trim, collapse internal whitespace and cap the length.
#[must_use]
pub fn normalize_query(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let truncated: String = collapsed.chars().take(MAX_QUERY_CHARS).collect();
    truncated.trim_end().to_string()
}

/// Whether a normalized query is long enough to search.
#[must_use]
pub fn is_searchable(query: &str) -> bool {
    query.chars().count() >= MIN_QUERY_CHARS
}

/// 0 = exact name, 1 = name prefix, 2 = name substring, 3 = elsewhere.
fn relevance_rank(name: &str, query: &str) -> u8 {
    let name = name.to_lowercase();
    let query = query.to_lowercase();
    if name == query {
        0
    } else if name.starts_with(&query) {
        1
    } else if name.contains(&query) {
        2
    } else {
        3
    }
}

fn by_name(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Higher ratings first, `None` last.
fn by_rating_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Order vendor hits in place.
///
/// Shops carry no price, so the price sorts order them by name.
pub fn sort_vendors(hits: &mut [VendorHit], sort: SearchSort, query: &str) {
    hits.sort_by(|a, b| {
        let (an, bn) = (&a.vendor.business_name, &b.vendor.business_name);
        match sort {
            SearchSort::Relevance => relevance_rank(an, query)
                .cmp(&relevance_rank(bn, query))
                .then_with(|| by_name(an, bn)),
            SearchSort::PriceAsc | SearchSort::PriceDesc => by_name(an, bn),
            SearchSort::Rating => {
                by_rating_desc(a.average_rating, b.average_rating).then_with(|| by_name(an, bn))
            }
            SearchSort::Newest => b
                .vendor
                .created_at
                .cmp(&a.vendor.created_at)
                .then_with(|| by_name(an, bn)),
        }
    });
}

/// Order product hits in place. Price sorts use the range midpoint.
pub fn sort_products(hits: &mut [ProductHit], sort: SearchSort, query: &str) {
    hits.sort_by(|a, b| {
        let (an, bn) = (&a.product.name, &b.product.name);
        match sort {
            SearchSort::Relevance => relevance_rank(an, query)
                .cmp(&relevance_rank(bn, query))
                .then_with(|| by_name(an, bn)),
            SearchSort::PriceAsc => a
                .product
                .price()
                .midpoint()
                .cmp(&b.product.price().midpoint())
                .then_with(|| by_name(an, bn)),
            SearchSort::PriceDesc => b
                .product
                .price()
                .midpoint()
                .cmp(&a.product.price().midpoint())
                .then_with(|| by_name(an, bn)),
            SearchSort::Rating => {
                by_rating_desc(a.vendor_rating, b.vendor_rating).then_with(|| by_name(an, bn))
            }
            SearchSort::Newest => b
                .product
                .created_at
                .cmp(&a.product.created_at)
                .then_with(|| by_name(an, bn)),
        }
    });
}
