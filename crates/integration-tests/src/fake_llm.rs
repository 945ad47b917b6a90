//! In-process stand-in for an OpenAI-compatible chat-completions gateway.

use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::{Value, json};

/// API key the test config hands to the API.
pub const LLM_API_KEY: &str = "test-llm-key";

/// What the gateway answers with.
#[derive(Debug, Clone)]
pub enum LlmReply {
    /// A text completion.
    Text(String),
    /// An image (as a data URL) with optional text.
    Image { url: String, text: Option<String> },
    /// A non-success status with an OpenAI-style error body.
    Status(u16),
}

struct LlmState {
    reply: LlmReply,
    calls: Vec<Value>,
}

/// Handle to a running fake gateway.
#[derive(Clone)]
pub struct FakeLlm {
    state: Arc<Mutex<LlmState>>,
    url: String,
}

impl FakeLlm {
    /// Start the fake on an ephemeral port. It answers `"ok"` until told
    /// otherwise.
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake LLM gateway");
        let addr = listener
            .local_addr()
            .expect("Fake LLM gateway has no address");
        let fake = Self {
            state: Arc::new(Mutex::new(LlmState {
                reply: LlmReply::Text("ok".to_string()),
                calls: Vec::new(),
            })),
            url: format!("http://{addr}"),
        };

        let app = Router::new()
            .route("/v1/chat/completions", post(completions))
            .with_state(fake.clone());
        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Fake LLM gateway stopped");
        });
        fake
    }

    /// Base URL of the fake.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    fn state(&self) -> MutexGuard<'_, LlmState> {
        self.state.lock().expect("Fake LLM state poisoned")
    }

    /// Set the next replies.
    pub fn reply(&self, reply: LlmReply) {
        self.state().reply = reply;
    }

    /// Request bodies received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<Value> {
        self.state().calls.clone()
    }
}

async fn completions(State(fake): State<FakeLlm>, Json(body): Json<Value>) -> Response {
    let reply = {
        let mut state = fake.state();
        state.calls.push(body);
        state.reply.clone()
    };

    match reply {
        LlmReply::Text(text) => Json(json!({
            "choices": [{ "message": { "role": "assistant", "content": text } }]
        }))
        .into_response(),
        LlmReply::Image { url, text } => Json(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": text,
                    "images": [{ "type": "image_url", "image_url": { "url": url } }]
                }
            }]
        }))
        .into_response(),
        LlmReply::Status(code) => {
            let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let mut response = (
                status,
                Json(json!({ "error": { "message": "simulated gateway error", "type": "test" } })),
            )
                .into_response();
            if code == 429 {
                response
                    .headers_mut()
                    .insert("retry-after", axum::http::HeaderValue::from_static("7"));
            }
            response
        }
    }
}
