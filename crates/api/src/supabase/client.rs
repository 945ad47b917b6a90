//! PostgREST and GoTrue client implementation.

use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use ushop_core::UserId;

use crate::config::SupabaseConfig;

use super::{Auth, Filter, SupabaseError, classify_error};

/// The authenticated user behind an access token.
#[derive(Debug, Clone, serde::Deserialize, Serialize)]
pub struct AuthUser {
    /// Supabase auth user ID (also the `profiles.id`).
    pub id: UserId,
    /// Sign-in email, if the account has one.
    #[serde(default)]
    pub email: Option<String>,
}

/// Client for the Supabase REST interfaces.
///
/// Cheaply cloneable; all clones share one connection pool.
#[derive(Clone)]
pub struct SupabaseClient {
    pub(super) inner: Arc<SupabaseClientInner>,
}

pub(super) struct SupabaseClientInner {
    pub(super) client: reqwest::Client,
    pub(super) base_url: String,
    pub(super) anon_key: String,
    pub(super) service_role_key: SecretString,
}

impl SupabaseClient {
    /// Create a new Supabase client.
    #[must_use]
    pub fn new(config: &SupabaseConfig) -> Self {
        Self {
            inner: Arc::new(SupabaseClientInner {
                client: reqwest::Client::new(),
                base_url: config.url.clone(),
                anon_key: config.anon_key.clone(),
                service_role_key: config.service_role_key.clone(),
            }),
        }
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.inner.base_url)
    }

    /// Start a request carrying the `apikey` and bearer headers for `auth`.
    pub(super) fn request(
        &self,
        method: reqwest::Method,
        url: &str,
        auth: Auth<'_>,
    ) -> reqwest::RequestBuilder {
        let (apikey, bearer) = match auth {
            Auth::Anon => (self.inner.anon_key.as_str(), self.inner.anon_key.as_str()),
            Auth::User(token) => (self.inner.anon_key.as_str(), token),
            Auth::Service => {
                let key = self.inner.service_role_key.expose_secret();
                (key, key)
            }
        };

        self.inner
            .client
            .request(method, url)
            .header("apikey", apikey)
            .header(AUTHORIZATION, format!("Bearer {bearer}"))
    }

    /// Send a request and return the body text of a successful response.
    pub(super) async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<(reqwest::header::HeaderMap, String), SupabaseError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(SupabaseError::RateLimited(retry_after));
        }

        let headers = response.headers().clone();
        let body = response.text().await?;

        if !status.is_success() {
            let err = classify_error(status.as_u16(), &body);
            if matches!(err, SupabaseError::Api { .. }) {
                tracing::error!(
                    status = %status,
                    body = %body.chars().take(500).collect::<String>(),
                    "Supabase returned non-success status"
                );
            } else {
                debug!(status = %status, error = %err, "Supabase request rejected");
            }
            return Err(err);
        }

        Ok((headers, body))
    }

    fn parse<T: DeserializeOwned>(body: &str) -> Result<T, SupabaseError> {
        serde_json::from_str(body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse Supabase response"
            );
            SupabaseError::Parse(e)
        })
    }

    // =========================================================================
    // PostgREST
    // =========================================================================

    /// Select rows from `table`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or rows don't deserialize as `T`.
    #[instrument(skip(self, filter, auth), fields(table = %table))]
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        filter: &Filter,
        auth: Auth<'_>,
    ) -> Result<Vec<T>, SupabaseError> {
        let request = self
            .request(reqwest::Method::GET, &self.rest_url(table), auth)
            .query(&filter.to_pairs());
        let (_, body) = self.send(request).await?;
        Self::parse(&body)
    }

    /// Select at most one row from `table`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails. No matching row is `Ok(None)`.
    pub async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        filter: &Filter,
        auth: Auth<'_>,
    ) -> Result<Option<T>, SupabaseError> {
        let filter = filter.clone().limit(1);
        let rows: Vec<T> = self.select(table, &filter, auth).await?;
        Ok(rows.into_iter().next())
    }

    /// Insert one row and return it as stored.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::Conflict` on unique violations, or another
    /// error if the request fails.
    #[instrument(skip(self, row, auth), fields(table = %table))]
    pub async fn insert<B, T>(&self, table: &str, row: &B, auth: Auth<'_>) -> Result<T, SupabaseError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self
            .request(reqwest::Method::POST, &self.rest_url(table), auth)
            .header("Prefer", "return=representation")
            .json(row);
        let (_, body) = self.send(request).await?;
        first_row(table, Self::parse(&body)?)
    }

    /// Insert or merge one row on the `on_conflict` columns.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, row, auth), fields(table = %table))]
    pub async fn upsert<B, T>(
        &self,
        table: &str,
        row: &B,
        on_conflict: &str,
        auth: Auth<'_>,
    ) -> Result<T, SupabaseError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self
            .request(reqwest::Method::POST, &self.rest_url(table), auth)
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .query(&[("on_conflict", on_conflict)])
            .json(row);
        let (_, body) = self.send(request).await?;
        first_row(table, Self::parse(&body)?)
    }

    /// Update rows matching `filter`; returns the updated rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, filter, patch, auth), fields(table = %table))]
    pub async fn update<B, T>(
        &self,
        table: &str,
        filter: &Filter,
        patch: &B,
        auth: Auth<'_>,
    ) -> Result<Vec<T>, SupabaseError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self
            .request(reqwest::Method::PATCH, &self.rest_url(table), auth)
            .header("Prefer", "return=representation")
            .query(&filter.condition_pairs())
            .json(patch);
        let (_, body) = self.send(request).await?;
        Self::parse(&body)
    }

    /// Delete rows matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, filter, auth), fields(table = %table))]
    pub async fn delete(
        &self,
        table: &str,
        filter: &Filter,
        auth: Auth<'_>,
    ) -> Result<(), SupabaseError> {
        let request = self
            .request(reqwest::Method::DELETE, &self.rest_url(table), auth)
            .header("Prefer", "return=minimal")
            .query(&filter.condition_pairs());
        self.send(request).await?;
        Ok(())
    }

    /// Count rows matching `filter` without fetching them.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or `Content-Range` is missing.
    #[instrument(skip(self, filter, auth), fields(table = %table))]
    pub async fn count(
        &self,
        table: &str,
        filter: &Filter,
        auth: Auth<'_>,
    ) -> Result<u64, SupabaseError> {
        let mut pairs = filter.condition_pairs();
        pairs.push(("select".to_string(), "id".to_string()));
        let request = self
            .request(reqwest::Method::HEAD, &self.rest_url(table), auth)
            .header("Prefer", "count=exact")
            .query(&pairs);
        let (headers, _) = self.send(request).await?;

        headers
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or_else(|| SupabaseError::Api {
                status: 200,
                code: "missing_content_range".to_string(),
                message: format!("count on {table} returned no total"),
            })
    }

    /// Cheap reachability check for readiness.
    ///
    /// # Errors
    ///
    /// Returns an error if the REST endpoint is unreachable or rejects the key.
    pub async fn ping(&self) -> Result<(), SupabaseError> {
        let url = format!("{}/rest/v1/", self.inner.base_url);
        let request = self.request(reqwest::Method::GET, &url, Auth::Anon);
        self.send(request).await?;
        Ok(())
    }

    // =========================================================================
    // GoTrue
    // =========================================================================

    /// Resolve an access token to its user.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::Unauthorized` for invalid or expired tokens.
    #[instrument(skip_all)]
    pub async fn get_user(&self, access_token: &str) -> Result<AuthUser, SupabaseError> {
        let url = format!("{}/auth/v1/user", self.inner.base_url);
        let request = self
            .request(reqwest::Method::GET, &url, Auth::User(access_token))
            .header(CONTENT_TYPE, "application/json");
        let (_, body) = self.send(request).await?;
        Self::parse(&body)
    }
}

fn first_row<T>(table: &str, rows: Vec<T>) -> Result<T, SupabaseError> {
    rows.into_iter().next().ok_or_else(|| SupabaseError::Api {
        status: 200,
        code: "empty_representation".to_string(),
        message: format!("write to {table} returned no row"),
    })
}

/// Parse the total out of `Content-Range: 0-24/573` or `*/0`.
fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit_once('/').and_then(|(_, total)| total.parse().ok())
}
