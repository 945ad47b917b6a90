//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding with a JSON body. All route handlers return
//! `Result<T, AppError>`.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::ai::AiError;
use crate::supabase::SupabaseError;

/// Where clients are sent when they need to sign in.
pub const SIGN_IN_PATH: &str = "/auth";

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Supabase operation failed.
    #[error("Supabase error: {0}")]
    Supabase(#[from] SupabaseError),

    /// LLM gateway operation failed.
    #[error("AI error: {0}")]
    Ai(#[from] AiError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is authenticated but may not do this.
    #[error("Forbidden: {message}")]
    Forbidden {
        /// What was denied.
        message: String,
        /// Page the client should route to instead.
        redirect: Option<String>,
    },

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// State conflict (duplicate, or an invalid status transition).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited(Option<u64>),

    /// A feature that depends on unconfigured infrastructure.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for a forbidden error without a redirect.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
            redirect: None,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Supabase(err) => match err {
                SupabaseError::NotFound(_) => StatusCode::NOT_FOUND,
                SupabaseError::Conflict(_) => StatusCode::CONFLICT,
                SupabaseError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                SupabaseError::Forbidden(_) => StatusCode::FORBIDDEN,
                SupabaseError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
                SupabaseError::Http(_) | SupabaseError::Api { .. } => StatusCode::BAD_GATEWAY,
                SupabaseError::Parse(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Ai(err) => match err {
                AiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
                AiError::PaymentRequired => StatusCode::PAYMENT_REQUIRED,
                AiError::Unauthorized(_) => StatusCode::INTERNAL_SERVER_ERROR,
                AiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                AiError::Http(_)
                | AiError::Api { .. }
                | AiError::Parse(_)
                | AiError::InvalidModelOutput(_) => StatusCode::BAD_GATEWAY,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // Don't expose internal error details to clients
    fn public_message(&self) -> String {
        match self {
            Self::Supabase(err) => match err {
                SupabaseError::NotFound(_) => "Not found".to_string(),
                SupabaseError::Conflict(_) => "Already exists".to_string(),
                SupabaseError::Unauthorized(_) => "Session expired, please sign in".to_string(),
                SupabaseError::Forbidden(_) => "Not allowed".to_string(),
                SupabaseError::RateLimited(_) => "Too many requests".to_string(),
                SupabaseError::Http(_) | SupabaseError::Api { .. } => {
                    "Database service error".to_string()
                }
                SupabaseError::Parse(_) => "Internal server error".to_string(),
            },
            Self::Ai(err) => match err {
                AiError::RateLimited(_) => "AI rate limit reached, try again shortly".to_string(),
                AiError::PaymentRequired => "AI credits exhausted".to_string(),
                AiError::Unauthorized(_) => "Internal server error".to_string(),
                AiError::InvalidInput(msg) => msg.clone(),
                _ => "AI service error".to_string(),
            },
            Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::BadRequest(msg)
            | Self::Conflict(msg)
            | Self::ServiceUnavailable(msg) => msg.clone(),
            Self::Forbidden { message, .. } => message.clone(),
            Self::RateLimited(_) => "Too many requests".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
        }
    }

    fn redirect(&self) -> Option<String> {
        match self {
            Self::Unauthorized(_) | Self::Supabase(SupabaseError::Unauthorized(_)) => {
                Some(SIGN_IN_PATH.to_string())
            }
            Self::Forbidden { redirect, .. } => redirect.clone(),
            _ => None,
        }
    }

    const fn retry_after(&self) -> Option<u64> {
        match self {
            Self::RateLimited(secs) => *secs,
            Self::Supabase(SupabaseError::RateLimited(secs))
            | Self::Ai(AiError::RateLimited(secs)) => Some(*secs),
            _ => None,
        }
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }

        let body = ErrorBody {
            error: self.public_message(),
            redirect: self.redirect(),
        };
        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = self.retry_after()
            && let Ok(value) = HeaderValue::from_str(&secs.to_string())
        {
            response.headers_mut().insert(RETRY_AFTER, value);
        }
        response
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("vendor".to_string());
        assert_eq!(err.to_string(), "Not found: vendor");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::forbidden("test")),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Conflict("test".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::RateLimited(None)),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(AppError::ServiceUnavailable("test".to_string())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_gateway_errors_map_to_documented_statuses() {
        assert_eq!(
            get_status(AiError::RateLimited(5).into()),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(AiError::PaymentRequired.into()),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            get_status(AiError::Unauthorized("bad key".to_string()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(
                AiError::Api {
                    status: 503,
                    message: "down".to_string()
                }
                .into()
            ),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_supabase_errors_map_to_statuses() {
        assert_eq!(
            get_status(SupabaseError::Conflict("dup".to_string()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(SupabaseError::Forbidden("rls".to_string()).into()),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_rate_limit_sets_retry_after() {
        let response = AppError::Ai(AiError::RateLimited(30)).into_response();
        assert_eq!(
            response.headers().get(RETRY_AFTER).and_then(|v| v.to_str().ok()),
            Some("30")
        );
    }

    #[test]
    fn test_redirects() {
        assert_eq!(
            AppError::Unauthorized("x".to_string()).redirect().as_deref(),
            Some(SIGN_IN_PATH)
        );
        let err = AppError::Forbidden {
            message: "admins only".to_string(),
            redirect: Some("/".to_string()),
        };
        assert_eq!(err.redirect().as_deref(), Some("/"));
        assert_eq!(AppError::BadRequest("x".to_string()).redirect(), None);
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::Internal("db password leaked in message".to_string());
        assert_eq!(err.public_message(), "Internal server error");
        let err = AppError::Ai(AiError::PaymentRequired);
        assert_eq!(err.public_message(), "AI credits exhausted");
    }
}
