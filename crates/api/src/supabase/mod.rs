//! Supabase REST clients (PostgREST, GoTrue auth, Storage).
//!
//! # Architecture
//!
//! - Supabase is the source of truth - no local database, direct REST calls
//! - Row-level security stays authoritative: user requests forward the
//!   caller's JWT, and only admin moderation uses the service role key
//! - Filters are built with [`Filter`] and rendered as PostgREST query pairs
//!
//! # Example
//!
//! ```rust,ignore
//! use ushop_api::supabase::{Auth, Filter, SupabaseClient};
//!
//! let client = SupabaseClient::new(&config.supabase);
//!
//! let filter = Filter::new()
//!     .eq("status", "approved")
//!     .order_desc("created_at")
//!     .limit(20);
//! let vendors: Vec<VendorRow> = client.select("vendors", &filter, Auth::Anon).await?;
//! ```

mod client;
mod filter;
mod storage;

pub use client::{AuthUser, SupabaseClient};
pub use filter::{Filter, escape_like};

use thiserror::Error;

/// Which credential a request is sent with.
#[derive(Debug, Clone, Copy)]
pub enum Auth<'a> {
    /// Public anon key; only rows RLS exposes to everyone.
    Anon,
    /// The signed-in caller's access token.
    User(&'a str),
    /// Service role key; bypasses RLS. Admin paths only.
    Service,
}

/// Errors that can occur when interacting with Supabase.
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// No row matched.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique constraint violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Token missing, expired, or invalid.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// RLS or grants denied the operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Rate limited by Supabase.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success response.
    #[error("API error {status} ({code}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// PostgREST / Postgres error code, or "unknown".
        code: String,
        /// Error message.
        message: String,
    },
}

/// Error body returned by PostgREST, GoTrue and Storage.
///
/// The three services disagree on field names, so every field is optional.
#[derive(Debug, Default, serde::Deserialize)]
struct ErrorBody {
    code: Option<serde_json::Value>,
    message: Option<String>,
    msg: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Map a non-success response to a [`SupabaseError`].
fn classify_error(status: u16, body: &str) -> SupabaseError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let code = match parsed.code {
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
        None => "unknown".to_string(),
    };
    let message = parsed
        .message
        .or(parsed.msg)
        .or(parsed.error_description)
        .or(parsed.error)
        .unwrap_or_else(|| body.chars().take(200).collect());

    match (status, code.as_str()) {
        (401, _) => SupabaseError::Unauthorized(message),
        (403, _) | (_, "42501") => SupabaseError::Forbidden(message),
        (404, _) | (_, "PGRST116") => SupabaseError::NotFound(message),
        (409, _) | (_, "23505") => SupabaseError::Conflict(message),
        _ => SupabaseError::Api {
            status,
            code,
            message,
        },
    }
}
