//! Search across shops and products.
//!
//! A query is normalized, then the vendor and product tables are searched
//! concurrently with ILIKE filters. Results are ordered in memory and, when
//! nothing matches, the LLM is asked for alternative terms.
//!
//! Identical searches within 30 seconds share one database round trip:
//! results are cached by normalized query, filters and sort, and concurrent
//! misses for the same key wait on a single fetch.

mod rank;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};
use ushop_core::{CategoryId, Score, VendorId};

use crate::ai::LlmClient;
use crate::db::{ProductRepository, RatingRepository, VendorRepository};
use crate::models::RatingSummary;
use crate::supabase::{SupabaseClient, SupabaseError};

pub use rank::{
    MAX_QUERY_CHARS, MIN_QUERY_CHARS, ProductHit, SearchSort, VendorHit, is_searchable,
    normalize_query, sort_products, sort_vendors,
};

/// Results per kind when the caller sends no limit.
pub const DEFAULT_LIMIT: u32 = 20;

/// Largest accepted limit per kind.
pub const MAX_LIMIT: u32 = 50;

/// Rows fetched per kind before ranking.
pub const SEARCH_WINDOW: u32 = 500;

const CACHE_TTL: Duration = Duration::from_secs(30);
const CACHE_CAPACITY: u64 = 1_000;

/// Query string of `GET /api/search`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub category: Option<CategoryId>,
    #[serde(default)]
    pub sort: SearchSort,
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Response of `GET /api/search`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResults {
    /// The normalized query that was run.
    pub query: String,
    pub vendors: Vec<VendorHit>,
    pub products: Vec<ProductHit>,
    /// Alternative searches, only when nothing matched.
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SearchKey {
    query: String,
    category: Option<CategoryId>,
    sort: SearchSort,
    limit: u32,
}

impl SearchKey {
    fn new(params: &SearchParams) -> Self {
        Self {
            query: normalize_query(&params.q),
            category: params.category,
            sort: params.sort,
            limit: params
                .limit
                .unwrap_or(DEFAULT_LIMIT)
                .clamp(1, MAX_LIMIT),
        }
    }
}

/// Search pipeline with a short-lived result cache.
#[derive(Clone)]
pub struct SearchEngine {
    cache: Cache<SearchKey, Arc<SearchResults>>,
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new(CACHE_TTL)
    }
}

impl SearchEngine {
    /// Create an engine whose results live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Run a search.
    ///
    /// Queries shorter than [`MIN_QUERY_CHARS`] return empty results without
    /// a database call. Suggestion failures are logged and yield none.
    ///
    /// # Errors
    ///
    /// Returns an error if either table query fails.
    #[instrument(skip(self, supabase, llm), fields(q = %params.q))]
    pub async fn search(
        &self,
        supabase: &SupabaseClient,
        llm: Option<&LlmClient>,
        params: &SearchParams,
    ) -> Result<Arc<SearchResults>, SupabaseError> {
        let key = SearchKey::new(params);
        if !is_searchable(&key.query) {
            return Ok(Arc::new(SearchResults {
                query: key.query,
                ..SearchResults::default()
            }));
        }

        self.cache
            .try_get_with(key.clone(), run(supabase, llm, key))
            .await
            .map_err(unshare)
    }

    /// Drop every cached result.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

async fn run(
    supabase: &SupabaseClient,
    llm: Option<&LlmClient>,
    key: SearchKey,
) -> Result<Arc<SearchResults>, SupabaseError> {
    let vendors_repo = VendorRepository::new(supabase);
    let products_repo = ProductRepository::new(supabase);
    let (vendors, products) = tokio::join!(
        vendors_repo.search(&key.query, key.category, SEARCH_WINDOW),
        products_repo.search(&key.query, key.category, SEARCH_WINDOW),
    );
    let (vendors, products) = (vendors?, products?);

    let mut vendor_ids: Vec<VendorId> = vendors
        .iter()
        .map(|v| v.id)
        .chain(products.iter().map(|p| p.vendor_id))
        .collect();
    vendor_ids.sort_unstable();
    vendor_ids.dedup();
    let scores = RatingRepository::new(supabase)
        .scores_for(&vendor_ids)
        .await?;
    let averages = vendor_averages(scores.into_iter().map(|row| (row.vendor_id, row.score)));

    let mut vendors: Vec<VendorHit> = vendors
        .into_iter()
        .map(|vendor| VendorHit {
            average_rating: averages.get(&vendor.id).copied(),
            vendor,
        })
        .collect();
    let mut products: Vec<ProductHit> = products
        .into_iter()
        .map(|product| ProductHit {
            vendor_rating: averages.get(&product.vendor_id).copied(),
            product,
        })
        .collect();
    sort_vendors(&mut vendors, key.sort, &key.query);
    sort_products(&mut products, key.sort, &key.query);
    let limit = usize::try_from(key.limit).unwrap_or(usize::MAX);
    vendors.truncate(limit);
    products.truncate(limit);

    let suggestions = if vendors.is_empty() && products.is_empty() {
        suggest(llm, &key.query).await
    } else {
        Vec::new()
    };

    Ok(Arc::new(SearchResults {
        query: key.query,
        vendors,
        products,
        suggestions,
    }))
}

async fn suggest(llm: Option<&LlmClient>, query: &str) -> Vec<String> {
    let Some(llm) = llm else {
        return Vec::new();
    };
    match llm.search_suggestions(query).await {
        Ok(suggestions) => suggestions,
        Err(e) => {
            warn!(error = %e, "Search suggestions failed");
            Vec::new()
        }
    }
}

pub(crate) fn vendor_averages(scores: impl Iterator<Item = (VendorId, Score)>) -> HashMap<VendorId, f64> {
    let mut grouped: HashMap<VendorId, Vec<Score>> = HashMap::new();
    for (vendor, score) in scores {
        grouped.entry(vendor).or_default().push(score);
    }
    grouped
        .into_iter()
        .filter_map(|(vendor, scores)| {
            RatingSummary::from_scores(scores)
                .average_if_rated()
                .map(|avg| (vendor, avg))
        })
        .collect()
}

// Concurrent waiters share the error; only the last holder can take it.
fn unshare(err: Arc<SupabaseError>) -> SupabaseError {
    Arc::try_unwrap(err).unwrap_or_else(|shared| SupabaseError::Api {
        status: 502,
        code: "search_failed".to_string(),
        message: shared.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_key_normalizes_and_clamps() {
        let key = SearchKey::new(&SearchParams {
            q: "  Bread   rolls ".to_string(),
            limit: Some(500),
            ..SearchParams::default()
        });
        assert_eq!(key.query, "Bread rolls");
        assert_eq!(key.limit, MAX_LIMIT);

        let key = SearchKey::new(&SearchParams {
            q: "x".to_string(),
            limit: Some(0),
            ..SearchParams::default()
        });
        assert_eq!(key.limit, 1);

        let key = SearchKey::new(&SearchParams::default());
        assert_eq!(key.limit, DEFAULT_LIMIT);
    }

    #[test]
    fn test_keystroke_variants_share_a_key() {
        let a = SearchKey::new(&SearchParams {
            q: "fresh bread".to_string(),
            ..SearchParams::default()
        });
        let b = SearchKey::new(&SearchParams {
            q: " fresh  bread ".to_string(),
            ..SearchParams::default()
        });
        assert_eq!(a, b);
    }

    #[test]
    fn test_vendor_averages() {
        let a = VendorId::random();
        let b = VendorId::random();
        let s = |v| Score::new(v).unwrap();
        let averages = vendor_averages(vec![(a, s(5)), (a, s(4)), (b, s(2))].into_iter());
        assert_eq!(averages[&a], 4.5);
        assert_eq!(averages[&b], 2.0);
    }

    #[tokio::test]
    async fn test_short_query_skips_database() {
        let client = SupabaseClient::new(&crate::config::SupabaseConfig {
            // Nothing listens here; a request would fail.
            url: "http://127.0.0.1:9".to_string(),
            anon_key: "anon".to_string(),
            service_role_key: secrecy::SecretString::from("service"),
        });
        let engine = SearchEngine::default();
        let results = engine
            .search(
                &client,
                None,
                &SearchParams {
                    q: "  a ".to_string(),
                    ..SearchParams::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(results.query, "a");
        assert!(results.vendors.is_empty() && results.products.is_empty());
        assert!(results.suggestions.is_empty());
    }
}
