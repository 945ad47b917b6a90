//! Chat-completions wire types (OpenAI-compatible gateway format).

use serde::{Deserialize, Serialize};

/// A message sent to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// "system", "user" or "assistant".
    pub role: String,
    /// Text or multi-part content.
    pub content: MessageContent,
}

impl ChatMessage {
    /// A system message.
    #[must_use]
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: MessageContent::Text(text.into()),
        }
    }

    /// A user message.
    #[must_use]
    pub fn user(content: MessageContent) -> Self {
        Self {
            role: "user".to_string(),
            content,
        }
    }
}

/// Message content - plain text or a list of parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Simple text content.
    Text(String),
    /// Text and image parts.
    Parts(Vec<ContentPart>),
}

/// One part of a multi-part message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Text part.
    Text {
        /// The text content.
        text: String,
    },
    /// Image part, by URL or `data:` URL.
    ImageUrl {
        /// The image reference.
        image_url: ImageUrl,
    },
}

/// Image reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUrl {
    /// `https://` or `data:<mime>;base64,<data>` URL.
    pub url: String,
}

/// Request body for `POST /v1/chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model identifier.
    pub model: String,
    /// Conversation messages.
    pub messages: Vec<ChatMessage>,
    /// Output modalities (e.g. `["image", "text"]` for image models).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modalities: Option<Vec<String>>,
}

/// Response body (non-streaming).
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    /// Completion choices; the gateway returns one.
    #[serde(default)]
    pub choices: Vec<Choice>,
}

/// A completion choice.
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    /// The generated message.
    pub message: ResponseMessage,
}

/// A generated message.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    /// Text output, if any.
    #[serde(default)]
    pub content: Option<String>,
    /// Generated images, for image-capable models.
    #[serde(default)]
    pub images: Vec<ResponseImage>,
}

/// A generated image.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseImage {
    /// Usually a `data:image/png;base64,...` URL.
    pub image_url: ImageUrl,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_multipart_message_serialization() {
        let message = ChatMessage::user(MessageContent::Parts(vec![
            ContentPart::Text {
                text: "Enhance this".to_string(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: "https://cdn/x.png".to_string(),
                },
            },
        ]));
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "role": "user",
                "content": [
                    { "type": "text", "text": "Enhance this" },
                    { "type": "image_url", "image_url": { "url": "https://cdn/x.png" } }
                ]
            })
        );
    }

    #[test]
    fn test_response_with_images() {
        let json = r#"{
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "Here you go",
                    "images": [{ "type": "image_url", "image_url": { "url": "data:image/png;base64,AAAA" } }]
                }
            }]
        }"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        let message = &response.choices[0].message;
        assert_eq!(message.content.as_deref(), Some("Here you go"));
        assert_eq!(message.images[0].image_url.url, "data:image/png;base64,AAAA");
    }
}
