//! LLM gateway client (OpenAI-compatible chat completions).

use std::sync::Arc;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use crate::config::LlmConfig;

use super::error::{AiError, ApiErrorResponse};
use super::types::{ChatMessage, ChatRequest, ChatResponse, ResponseMessage};

/// Client for the hosted LLM gateway.
///
/// Stateless: every call is a single non-streaming completion.
#[derive(Clone)]
pub struct LlmClient {
    inner: Arc<LlmClientInner>,
}

struct LlmClientInner {
    client: reqwest::Client,
    endpoint: String,
    api_key: SecretString,
    model: String,
    image_model: String,
}

impl LlmClient {
    /// Create a new gateway client.
    #[must_use]
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            inner: Arc::new(LlmClientInner {
                client: reqwest::Client::new(),
                endpoint: format!(
                    "{}/v1/chat/completions",
                    config.gateway_url.trim_end_matches('/')
                ),
                api_key: config.api_key.clone(),
                model: config.model.clone(),
                image_model: config.image_model.clone(),
            }),
        }
    }

    /// Run a text completion and return the model's text.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway fails or the reply has no text.
    #[instrument(skip(self, messages), fields(model = %self.inner.model))]
    pub async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, AiError> {
        let request = ChatRequest {
            model: self.inner.model.clone(),
            messages,
            modalities: None,
        };
        let message = self.send(&request).await?;
        message
            .content
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| AiError::InvalidModelOutput("empty completion".to_string()))
    }

    /// Run an image-modality completion.
    ///
    /// Returns the whole message: image-capable models put results in
    /// `images`, others answer in `content` only.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway fails.
    #[instrument(skip(self, messages), fields(model = %self.inner.image_model))]
    pub async fn generate_image(
        &self,
        messages: Vec<ChatMessage>,
    ) -> Result<ResponseMessage, AiError> {
        let request = ChatRequest {
            model: self.inner.image_model.clone(),
            messages,
            modalities: Some(vec!["image".to_string(), "text".to_string()]),
        };
        self.send(&request).await
    }

    async fn send(&self, request: &ChatRequest) -> Result<ResponseMessage, AiError> {
        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .bearer_auth(self.inner.api_key.expose_secret())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::handle_error_status(status, response).await);
        }

        let body = response.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| AiError::Parse(format!("Failed to parse response: {e}")))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| AiError::InvalidModelOutput("no choices returned".to_string()))
    }

    async fn handle_error_status(status: StatusCode, response: reqwest::Response) -> AiError {
        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60);
                AiError::RateLimited(retry_after)
            }
            StatusCode::PAYMENT_REQUIRED => AiError::PaymentRequired,
            StatusCode::UNAUTHORIZED => AiError::Unauthorized("Invalid API key".to_string()),
            _ => match response.text().await {
                Ok(body) => {
                    let message = serde_json::from_str::<ApiErrorResponse>(&body)
                        .map_or(body, |api_error| api_error.error.message);
                    tracing::error!(status = %status, message = %message, "LLM gateway error");
                    AiError::Api {
                        status: status.as_u16(),
                        message,
                    }
                }
                Err(e) => AiError::Http(e),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client = LlmClient::new(&LlmConfig {
            gateway_url: "https://gateway.local/".to_string(),
            api_key: SecretString::from("k"),
            model: "m".to_string(),
            image_model: "im".to_string(),
        });
        assert_eq!(
            client.inner.endpoint,
            "https://gateway.local/v1/chat/completions"
        );
    }

    #[test]
    fn test_llm_client_is_clone_send_sync() {
        fn assert_traits<T: Clone + Send + Sync>() {}
        assert_traits::<LlmClient>();
    }
}
