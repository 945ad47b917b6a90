//! Prompt templates and request payloads for the assist functions.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;

use super::error::AiError;
use super::types::{ChatMessage, ContentPart, ImageUrl, MessageContent};

/// Largest decoded image accepted for enhancement (5 MiB).
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Most suggestions returned for one query.
pub const MAX_SUGGESTIONS: usize = 5;

const MAX_PRODUCT_NAME_CHARS: usize = 120;
const MAX_KEYWORDS: usize = 10;
const MAX_QUERY_CHARS: usize = 100;

const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

const DESCRIPTION_SYSTEM: &str = "You write product descriptions for small local shops. \
Write 2-3 sentences of plain text. No Markdown, no headings, no lists, no emoji. \
Do not invent prices, certifications or health claims.";

const IMAGE_SYSTEM: &str = "You are a product photo editor. Improve lighting, color balance \
and sharpness, and clean up the background, without changing the product itself.";

const SUGGESTION_SYSTEM: &str = "You help shoppers search a local marketplace of shops and \
products. Reply with only a JSON array of at most 5 short alternative search terms.";

// =============================================================================
// Product description
// =============================================================================

/// Body of `POST /functions/v1/generate-description`.
#[derive(Debug, Clone, Deserialize)]
pub struct DescriptionRequest {
    /// Product name.
    pub product_name: String,
    /// Category name, if the vendor picked one.
    #[serde(default)]
    pub category: Option<String>,
    /// Extra words to work in.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Voice, e.g. "friendly" or "premium".
    #[serde(default)]
    pub tone: Option<String>,
}

impl DescriptionRequest {
    /// Validate and render the prompt.
    ///
    /// # Errors
    ///
    /// Returns `AiError::InvalidInput` for a blank or oversized name.
    pub fn to_messages(&self) -> Result<Vec<ChatMessage>, AiError> {
        let name = self.product_name.trim();
        if name.is_empty() {
            return Err(AiError::InvalidInput("product_name is required".to_string()));
        }
        if name.chars().count() > MAX_PRODUCT_NAME_CHARS {
            return Err(AiError::InvalidInput(format!(
                "product_name must be at most {MAX_PRODUCT_NAME_CHARS} characters"
            )));
        }

        let mut prompt = format!("Product: {name}\n");
        if let Some(category) = non_blank(self.category.as_deref()) {
            prompt.push_str(&format!("Category: {category}\n"));
        }
        let keywords: Vec<&str> = self
            .keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .take(MAX_KEYWORDS)
            .collect();
        if !keywords.is_empty() {
            prompt.push_str(&format!("Keywords: {}\n", keywords.join(", ")));
        }
        let tone = non_blank(self.tone.as_deref()).unwrap_or("friendly");
        prompt.push_str(&format!("Tone: {tone}\n\nWrite the description."));

        Ok(vec![
            ChatMessage::system(DESCRIPTION_SYSTEM),
            ChatMessage::user(MessageContent::Text(prompt)),
        ])
    }
}

// =============================================================================
// Image enhancement
// =============================================================================

/// Body of `POST /functions/v1/enhance-image`.
///
/// Exactly one of `image_url` or `image_base64` (with `mime_type`).
#[derive(Debug, Clone, Deserialize)]
pub struct ImageRequest {
    /// Publicly reachable image URL.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Raw image bytes, base64 encoded.
    #[serde(default)]
    pub image_base64: Option<String>,
    /// MIME type of `image_base64`.
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Optional extra direction from the vendor.
    #[serde(default)]
    pub instructions: Option<String>,
}

impl ImageRequest {
    /// Validate the source and render the prompt.
    ///
    /// # Errors
    ///
    /// Returns `AiError::InvalidInput` for a missing or ambiguous source,
    /// bad base64, an unsupported type, or a payload over [`MAX_IMAGE_BYTES`].
    pub fn to_messages(&self) -> Result<Vec<ChatMessage>, AiError> {
        let url = self.image_reference()?;
        let mut text = "Enhance this product photo for an online shop listing.".to_string();
        if let Some(extra) = non_blank(self.instructions.as_deref()) {
            text.push_str(&format!(" Additional direction: {extra}"));
        }

        Ok(vec![
            ChatMessage::system(IMAGE_SYSTEM),
            ChatMessage::user(MessageContent::Parts(vec![
                ContentPart::Text { text },
                ContentPart::ImageUrl {
                    image_url: ImageUrl { url },
                },
            ])),
        ])
    }

    fn image_reference(&self) -> Result<String, AiError> {
        let url = non_blank(self.image_url.as_deref());
        let data = non_blank(self.image_base64.as_deref());
        match (url, data) {
            (Some(url), None) => {
                let parsed = url::Url::parse(url)
                    .map_err(|e| AiError::InvalidInput(format!("image_url: {e}")))?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(AiError::InvalidInput(
                        "image_url must be http or https".to_string(),
                    ));
                }
                Ok(parsed.into())
            }
            (None, Some(data)) => {
                let mime = non_blank(self.mime_type.as_deref()).ok_or_else(|| {
                    AiError::InvalidInput("mime_type is required with image_base64".to_string())
                })?;
                if !ALLOWED_IMAGE_TYPES.contains(&mime) {
                    return Err(AiError::InvalidInput(format!(
                        "unsupported image type: {mime}"
                    )));
                }
                // Cheap bound before decoding: 4 base64 chars per 3 bytes.
                if data.len() / 4 * 3 > MAX_IMAGE_BYTES + 3 {
                    return Err(too_large());
                }
                let bytes = STANDARD
                    .decode(data)
                    .map_err(|e| AiError::InvalidInput(format!("image_base64: {e}")))?;
                if bytes.len() > MAX_IMAGE_BYTES {
                    return Err(too_large());
                }
                Ok(format!("data:{mime};base64,{data}"))
            }
            (Some(_), Some(_)) => Err(AiError::InvalidInput(
                "send either image_url or image_base64, not both".to_string(),
            )),
            (None, None) => Err(AiError::InvalidInput(
                "image_url or image_base64 is required".to_string(),
            )),
        }
    }
}

fn too_large() -> AiError {
    AiError::InvalidInput(format!("image exceeds {MAX_IMAGE_BYTES} bytes"))
}

// =============================================================================
// Search suggestions
// =============================================================================

/// Body of `POST /functions/v1/search-suggestions`.
#[derive(Debug, Clone, Deserialize)]
pub struct SuggestionRequest {
    /// What the shopper typed.
    pub query: String,
}

/// Render the suggestion prompt for `query`.
///
/// # Errors
///
/// Returns `AiError::InvalidInput` if the query is blank.
pub fn suggestion_messages(query: &str) -> Result<Vec<ChatMessage>, AiError> {
    let query: String = query.trim().chars().take(MAX_QUERY_CHARS).collect();
    if query.is_empty() {
        return Err(AiError::InvalidInput("query is required".to_string()));
    }
    Ok(vec![
        ChatMessage::system(SUGGESTION_SYSTEM),
        ChatMessage::user(MessageContent::Text(format!(
            "The search \"{query}\" found nothing. Suggest related searches."
        ))),
    ])
}

/// Trim, drop blanks and case-insensitive duplicates, cap at [`MAX_SUGGESTIONS`].
#[must_use]
pub fn clean_suggestions(raw: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    raw.into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && seen.insert(s.to_lowercase()))
        .take(MAX_SUGGESTIONS)
        .collect()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user_text(messages: &[ChatMessage]) -> String {
        match &messages[1].content {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Parts(_) => panic!("expected text"),
        }
    }

    #[test]
    fn test_description_prompt_includes_details() {
        let request = DescriptionRequest {
            product_name: "  Sourdough loaf ".to_string(),
            category: Some("Bakery".to_string()),
            keywords: vec!["organic".to_string(), " ".to_string(), "rye".to_string()],
            tone: None,
        };
        let messages = request.to_messages().unwrap();
        assert_eq!(messages[0].role, "system");
        let text = user_text(&messages);
        assert!(text.contains("Product: Sourdough loaf\n"));
        assert!(text.contains("Category: Bakery"));
        assert!(text.contains("Keywords: organic, rye"));
        assert!(text.contains("Tone: friendly"));
    }

    #[test]
    fn test_description_requires_name() {
        let request = DescriptionRequest {
            product_name: "   ".to_string(),
            category: None,
            keywords: Vec::new(),
            tone: None,
        };
        assert!(matches!(request.to_messages(), Err(AiError::InvalidInput(_))));
    }

    fn image(url: Option<&str>, data: Option<&str>, mime: Option<&str>) -> ImageRequest {
        ImageRequest {
            image_url: url.map(String::from),
            image_base64: data.map(String::from),
            mime_type: mime.map(String::from),
            instructions: None,
        }
    }

    #[test]
    fn test_image_url_source() {
        let messages = image(Some("https://cdn.example.org/a.png"), None, None)
            .to_messages()
            .unwrap();
        match &messages[1].content {
            MessageContent::Parts(parts) => match &parts[1] {
                ContentPart::ImageUrl { image_url } => {
                    assert_eq!(image_url.url, "https://cdn.example.org/a.png");
                }
                ContentPart::Text { .. } => panic!("expected image part"),
            },
            MessageContent::Text(_) => panic!("expected parts"),
        }
    }

    #[test]
    fn test_image_base64_becomes_data_url() {
        let data = STANDARD.encode(b"fakepng");
        let request = image(None, Some(&data), Some("image/png"));
        assert_eq!(
            request.image_reference().unwrap(),
            format!("data:image/png;base64,{data}")
        );
    }

    #[test]
    fn test_image_source_validation() {
        assert!(image(None, None, None).image_reference().is_err());
        assert!(image(Some("https://a/b.png"), Some("AAAA"), Some("image/png"))
            .image_reference()
            .is_err());
        assert!(image(None, Some("AAAA"), None).image_reference().is_err());
        assert!(image(None, Some("AAAA"), Some("image/gif")).image_reference().is_err());
        assert!(image(None, Some("not base64!"), Some("image/png"))
            .image_reference()
            .is_err());
        assert!(image(Some("ftp://a/b.png"), None, None).image_reference().is_err());
    }

    #[test]
    fn test_image_size_cap() {
        let data = STANDARD.encode(vec![0u8; MAX_IMAGE_BYTES + 1]);
        let err = image(None, Some(&data), Some("image/jpeg"))
            .image_reference()
            .unwrap_err();
        assert!(err.to_string().contains("exceeds"));
    }

    #[test]
    fn test_suggestion_prompt() {
        let messages = suggestion_messages("  vegan cheese ").unwrap();
        assert!(user_text(&messages).contains("\"vegan cheese\""));
        assert!(suggestion_messages(" ").is_err());
    }

    #[test]
    fn test_clean_suggestions() {
        let raw = vec![
            " Cheese ".to_string(),
            "cheese".to_string(),
            String::new(),
            "dairy".to_string(),
            "deli".to_string(),
            "farm shop".to_string(),
            "grocer".to_string(),
            "market".to_string(),
        ];
        assert_eq!(
            clean_suggestions(raw),
            vec!["Cheese", "dairy", "deli", "farm shop", "grocer"]
        );
    }
}
