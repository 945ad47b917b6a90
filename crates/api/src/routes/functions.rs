//! AI-assist and notification functions under `/functions/v1`.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument};
use ushop_core::{Role, UserId};

use crate::ai::{DescriptionRequest, EnhancedImage, ImageRequest, SuggestionRequest};
use crate::error::{AppError, Result};
use crate::middleware::{AuthRejection, Caller, RequireUser};
use crate::state::AppState;

use super::validate::required_text;

const MAX_TITLE_CHARS: usize = 100;
const MAX_BODY_CHARS: usize = 500;

/// Vendor tooling is open to vendors and admins, approved or not, so a
/// shop can draft listings while its application is pending.
fn require_vendor_role(caller: &Caller) -> Result<()> {
    if caller.role.satisfies(Role::Vendor) {
        Ok(())
    } else {
        Err(AuthRejection::WrongRole(caller.role).into())
    }
}

// =============================================================================
// AI assist
// =============================================================================

/// Response of `generate-description`.
#[derive(Debug, Serialize)]
pub struct DescriptionResponse {
    pub description: String,
}

/// Write a product description.
#[instrument(skip(state, caller, body), fields(user_id = %caller.id()))]
pub async fn generate_description(
    State(state): State<AppState>,
    RequireUser(caller): RequireUser,
    Json(body): Json<DescriptionRequest>,
) -> Result<Json<DescriptionResponse>> {
    require_vendor_role(&caller)?;
    let description = state.require_llm()?.generate_description(&body).await?;
    Ok(Json(DescriptionResponse { description }))
}

/// Enhance a product photo.
#[instrument(skip(state, caller, body), fields(user_id = %caller.id()))]
pub async fn enhance_image(
    State(state): State<AppState>,
    RequireUser(caller): RequireUser,
    Json(body): Json<ImageRequest>,
) -> Result<Json<EnhancedImage>> {
    require_vendor_role(&caller)?;
    let enhanced = state.require_llm()?.enhance_image(&body).await?;
    Ok(Json(enhanced))
}

/// Response of `search-suggestions`.
#[derive(Debug, Serialize)]
pub struct SuggestionResponse {
    pub suggestions: Vec<String>,
}

/// Alternative search terms for a query.
#[instrument(skip(state, body))]
pub async fn search_suggestions(
    State(state): State<AppState>,
    Json(body): Json<SuggestionRequest>,
) -> Result<Json<SuggestionResponse>> {
    let suggestions = state.require_llm()?.search_suggestions(&body.query).await?;
    Ok(Json(SuggestionResponse { suggestions }))
}

// =============================================================================
// Push notifications
// =============================================================================

/// Body of `push-notification`.
#[derive(Debug, Deserialize)]
pub struct PushRequest {
    pub user_id: UserId,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Response of `push-notification`.
#[derive(Debug, Serialize)]
pub struct PushResponse {
    pub queued: bool,
    pub reason: &'static str,
}

/// Accept a push notification. Delivery is not wired up; the payload is
/// validated and logged.
#[instrument(skip(caller, body), fields(sender_id = %caller.id(), user_id = %body.user_id))]
pub async fn push_notification(
    RequireUser(caller): RequireUser,
    Json(body): Json<PushRequest>,
) -> Result<(StatusCode, Json<PushResponse>)> {
    let title = required_text("title", &body.title, 1, MAX_TITLE_CHARS)?;
    let text = required_text("body", &body.body, 1, MAX_BODY_CHARS)?;
    if body.data.as_ref().is_some_and(|d| !d.is_object()) {
        return Err(AppError::BadRequest("data must be a JSON object".to_string()));
    }

    info!(
        title = %title,
        body = %text,
        has_data = body.data.is_some(),
        "Push notification received"
    );
    Ok((
        StatusCode::ACCEPTED,
        Json(PushResponse {
            queued: false,
            reason: "push delivery not configured",
        }),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_push_request_data_is_optional() {
        let body: PushRequest = serde_json::from_str(
            r#"{"user_id": "5f0c3c84-2a4a-4c56-9f6a-9d2f5d1e7a10", "title": "Hi", "body": "There"}"#,
        )
        .unwrap();
        assert!(body.data.is_none());
    }

    #[test]
    fn test_push_response_shape() {
        let json = serde_json::to_value(PushResponse {
            queued: false,
            reason: "push delivery not configured",
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"queued": false, "reason": "push delivery not configured"})
        );
    }
}
