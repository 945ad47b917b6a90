//! AI-assist functions backed by a hosted LLM gateway.
//!
//! # Features
//!
//! - Product descriptions from a name, category and keywords
//! - Product photo enhancement through the gateway's image modality
//! - Alternative search terms when a search comes back empty
//!
//! Each call is a single stateless completion. Nothing is stored.

mod client;
mod error;
pub mod extract;
pub mod prompts;
pub mod types;

pub use client::LlmClient;
pub use error::{AiError, ApiErrorResponse};
pub use prompts::{DescriptionRequest, ImageRequest, SuggestionRequest};

use serde::Serialize;

/// Result of an image enhancement.
#[derive(Debug, Clone, Serialize)]
pub struct EnhancedImage {
    /// Enhanced image as a `data:` URL, when the model returned one.
    pub image_url: Option<String>,
    /// The model's text, e.g. editing notes or advice when no image came back.
    pub notes: Option<String>,
}

impl LlmClient {
    /// Write a product description.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid input or a gateway failure.
    pub async fn generate_description(
        &self,
        request: &DescriptionRequest,
    ) -> Result<String, AiError> {
        let text = self.complete(request.to_messages()?).await?;
        Ok(strip_wrapping_quotes(text.trim()).to_string())
    }

    /// Enhance a product photo.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid input, a gateway failure, or a reply
    /// with neither an image nor text.
    pub async fn enhance_image(&self, request: &ImageRequest) -> Result<EnhancedImage, AiError> {
        let message = self.generate_image(request.to_messages()?).await?;
        let image_url = message.images.into_iter().next().map(|i| i.image_url.url);
        let notes = message
            .content
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        if image_url.is_none() && notes.is_none() {
            return Err(AiError::InvalidModelOutput(
                "no image or text returned".to_string(),
            ));
        }
        Ok(EnhancedImage { image_url, notes })
    }

    /// Suggest up to five alternative searches for `query`.
    ///
    /// # Errors
    ///
    /// Returns an error for a blank query, a gateway failure, or output that
    /// holds no JSON string array.
    pub async fn search_suggestions(&self, query: &str) -> Result<Vec<String>, AiError> {
        let text = self.complete(prompts::suggestion_messages(query)?).await?;
        let raw: Vec<String> = extract::extract_json(&text)?;
        Ok(prompts::clean_suggestions(raw))
    }
}

fn strip_wrapping_quotes(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_wrapping_quotes() {
        assert_eq!(strip_wrapping_quotes("\"Fresh bread.\""), "Fresh bread.");
        assert_eq!(strip_wrapping_quotes("Say \"hi\" today"), "Say \"hi\" today");
    }
}
