//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use crate::ai::LlmClient;
use crate::config::ApiConfig;
use crate::error::AppError;
use crate::models::Category;
use crate::search::SearchEngine;
use crate::supabase::SupabaseClient;

const CATEGORY_CACHE_TTL: Duration = Duration::from_secs(600);

/// Key of the single cached category list.
pub const CATEGORIES_KEY: &str = "all";

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the upstream clients, caches and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    supabase: SupabaseClient,
    llm: Option<LlmClient>,
    search: SearchEngine,
    categories: Cache<&'static str, Arc<Vec<Category>>>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The LLM client is only built when the gateway is configured.
    #[must_use]
    pub fn new(config: ApiConfig) -> Self {
        let supabase = SupabaseClient::new(&config.supabase);
        let llm = config.llm.as_ref().map(LlmClient::new);
        let categories = Cache::builder()
            .max_capacity(1)
            .time_to_live(CATEGORY_CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(AppStateInner {
                config,
                supabase,
                llm,
                search: SearchEngine::default(),
                categories,
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the Supabase client.
    #[must_use]
    pub fn supabase(&self) -> &SupabaseClient {
        &self.inner.supabase
    }

    /// Get the LLM client, if configured.
    #[must_use]
    pub fn llm(&self) -> Option<&LlmClient> {
        self.inner.llm.as_ref()
    }

    /// Get the LLM client or fail with 503.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ServiceUnavailable` when no gateway is configured.
    pub fn require_llm(&self) -> Result<&LlmClient, AppError> {
        self.llm().ok_or_else(|| {
            AppError::ServiceUnavailable("AI features are not configured".to_string())
        })
    }

    /// Get a reference to the search pipeline.
    #[must_use]
    pub fn search(&self) -> &SearchEngine {
        &self.inner.search
    }

    /// Get a reference to the category list cache.
    #[must_use]
    pub fn categories(&self) -> &Cache<&'static str, Arc<Vec<Category>>> {
        &self.inner.categories
    }
}
