//! Error types for the LLM gateway client.

use thiserror::Error;

/// Errors that can occur when calling the LLM gateway.
#[derive(Debug, Error)]
pub enum AiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Gateway returned an error.
    #[error("gateway error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
    },

    /// Rate limited by the gateway.
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Workspace credits exhausted.
    #[error("AI credits exhausted")]
    PaymentRequired,

    /// The API key was rejected.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Failed to parse the gateway response envelope.
    #[error("parse error: {0}")]
    Parse(String),

    /// The model answered, but not in the shape the prompt asked for.
    #[error("invalid model output: {0}")]
    InvalidModelOutput(String),

    /// The caller's input was rejected before calling the gateway.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Error envelope returned by OpenAI-compatible gateways.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorResponse {
    /// Nested error details.
    pub error: ApiError,
}

/// Nested error details.
#[derive(Debug, serde::Deserialize)]
pub struct ApiError {
    /// Error message.
    pub message: String,
    /// Error type, when the gateway sends one.
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_error_display() {
        assert_eq!(
            AiError::RateLimited(60).to_string(),
            "rate limited, retry after 60 seconds"
        );
        let err = AiError::Api {
            status: 500,
            message: "upstream model unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "gateway error (500): upstream model unavailable");
    }

    #[test]
    fn test_api_error_deserialization() {
        let json = r#"{"error": {"message": "model not found", "type": "invalid_request_error"}}"#;
        let response: ApiErrorResponse = serde_json::from_str(json).expect("deserialize");
        assert_eq!(response.error.message, "model not found");
        assert_eq!(response.error.error_type.as_deref(), Some("invalid_request_error"));
    }
}
