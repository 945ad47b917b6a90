//! AI-assist functions and the push stub.

use axum::http::StatusCode;
use serde_json::json;
use ushop_core::Role;
use ushop_integration_tests::{
    ADMIN_TOKEN, LlmReply, TestApp, USER_TOKEN, VENDOR_TOKEN, seed_cast, seed_vendor,
};

const DESCRIBE: &str = "/functions/v1/generate-description";
const ENHANCE: &str = "/functions/v1/enhance-image";
const SUGGEST: &str = "/functions/v1/search-suggestions";
const PUSH: &str = "/functions/v1/push-notification";

fn loaf() -> serde_json::Value {
    json!({
        "product_name": "Sourdough loaf",
        "category": "Bakery",
        "keywords": ["rye", "slow ferment"],
        "tone": "warm",
    })
}

// =============================================================================
// generate-description
// =============================================================================

#[tokio::test]
async fn test_generate_description() {
    let app = TestApp::new().await;
    seed_cast(&app.supabase);
    app.llm().reply(LlmReply::Text(
        "  \"A tangy loaf with a blistered crust.\"\n".to_string(),
    ));

    let response = app.post(DESCRIBE, Some(VENDOR_TOKEN), loaf()).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["description"], "A tangy loaf with a blistered crust.");

    let calls = app.llm().calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0]["model"], "test/text-model");
    let prompt = calls[0]["messages"].to_string();
    assert!(prompt.contains("Sourdough loaf"));
    assert!(prompt.contains("slow ferment"));
}

#[tokio::test]
async fn test_description_open_to_pending_vendors_and_admins() {
    let app = TestApp::new().await;
    seed_cast(&app.supabase);
    let owner = app.supabase.add_user("pending-vendor", Role::Vendor);
    seed_vendor(&app.supabase, owner, "Quiet Florist", "pending");
    app.llm().reply(LlmReply::Text("Hand-tied tulips.".to_string()));

    let pending = app.post(DESCRIBE, Some("pending-vendor"), loaf()).await;
    assert_eq!(pending.status, StatusCode::OK);

    let admin = app.post(DESCRIBE, Some(ADMIN_TOKEN), loaf()).await;
    assert_eq!(admin.status, StatusCode::OK);
}

#[tokio::test]
async fn test_description_rejects_shoppers() {
    let app = TestApp::new().await;
    seed_cast(&app.supabase);

    let shopper = app.post(DESCRIBE, Some(USER_TOKEN), loaf()).await;
    assert_eq!(shopper.status, StatusCode::FORBIDDEN);
    assert_eq!(shopper.body["redirect"], "/");

    let anonymous = app.post(DESCRIBE, None, loaf()).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
    assert!(app.llm().calls().is_empty());
}

#[tokio::test]
async fn test_description_requires_product_name() {
    let app = TestApp::new().await;
    seed_cast(&app.supabase);

    let response = app
        .post(DESCRIBE, Some(VENDOR_TOKEN), json!({ "product_name": "  " }))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error(), "product_name is required");
    assert!(app.llm().calls().is_empty());
}

#[tokio::test]
async fn test_functions_without_llm_are_unavailable() {
    let app = TestApp::without_llm().await;
    seed_cast(&app.supabase);

    let response = app.post(DESCRIBE, Some(VENDOR_TOKEN), loaf()).await;

    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.error(), "AI features are not configured");
}

#[tokio::test]
async fn test_gateway_errors_are_mapped() {
    let app = TestApp::new().await;
    seed_cast(&app.supabase);

    app.llm().reply(LlmReply::Status(402));
    let credits = app.post(DESCRIBE, Some(VENDOR_TOKEN), loaf()).await;
    assert_eq!(credits.status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(credits.error(), "AI credits exhausted");

    app.llm().reply(LlmReply::Status(429));
    let limited = app.post(DESCRIBE, Some(VENDOR_TOKEN), loaf()).await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        limited.headers.get("retry-after").and_then(|v| v.to_str().ok()),
        Some("7")
    );

    app.llm().reply(LlmReply::Status(500));
    let broken = app.post(DESCRIBE, Some(VENDOR_TOKEN), loaf()).await;
    assert_eq!(broken.status, StatusCode::BAD_GATEWAY);
    assert_eq!(broken.error(), "AI service error");
}

// =============================================================================
// enhance-image
// =============================================================================

#[tokio::test]
async fn test_enhance_image() {
    let app = TestApp::new().await;
    seed_cast(&app.supabase);
    app.llm().reply(LlmReply::Image {
        url: "data:image/png;base64,iVBORw0KGgo=".to_string(),
        text: None,
    });

    let response = app
        .post(
            ENHANCE,
            Some(VENDOR_TOKEN),
            json!({ "image_url": "https://cdn.example.test/loaf.jpg" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["image_url"], "data:image/png;base64,iVBORw0KGgo=");
    assert!(response.body["notes"].is_null());

    let calls = app.llm().calls();
    assert_eq!(calls[0]["model"], "test/image-model");
    assert!(calls[0]["messages"].to_string().contains("https://cdn.example.test/loaf.jpg"));
}

#[tokio::test]
async fn test_enhance_image_validates_source() {
    let app = TestApp::new().await;
    seed_cast(&app.supabase);

    let neither = app.post(ENHANCE, Some(VENDOR_TOKEN), json!({})).await;
    assert_eq!(neither.status, StatusCode::BAD_REQUEST);

    let ftp = app
        .post(ENHANCE, Some(VENDOR_TOKEN), json!({ "image_url": "ftp://example.test/a.jpg" }))
        .await;
    assert_eq!(ftp.status, StatusCode::BAD_REQUEST);

    let no_mime = app
        .post(ENHANCE, Some(VENDOR_TOKEN), json!({ "image_base64": "iVBORw0KGgo=" }))
        .await;
    assert_eq!(no_mime.status, StatusCode::BAD_REQUEST);
    assert_eq!(no_mime.error(), "mime_type is required with image_base64");

    assert!(app.llm().calls().is_empty());
}

#[tokio::test]
async fn test_enhance_image_empty_reply_is_gateway_error() {
    let app = TestApp::new().await;
    seed_cast(&app.supabase);
    app.llm().reply(LlmReply::Text("   ".to_string()));

    let response = app
        .post(
            ENHANCE,
            Some(VENDOR_TOKEN),
            json!({ "image_base64": "iVBORw0KGgo=", "mime_type": "image/png" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
}

// =============================================================================
// search-suggestions
// =============================================================================

#[tokio::test]
async fn test_search_suggestions() {
    let app = TestApp::new().await;
    app.llm().reply(LlmReply::Text(
        "Try these:\n```json\n[\"rye bread\", \"Rye Bread\", \"bagels\"]\n```".to_string(),
    ));

    let response = app.post(SUGGEST, None, json!({ "query": "ryebred" })).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["suggestions"], json!(["rye bread", "bagels"]));
}

#[tokio::test]
async fn test_search_suggestions_unparseable_reply() {
    let app = TestApp::new().await;

    let response = app.post(SUGGEST, None, json!({ "query": "ryebred" })).await;

    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert_eq!(response.error(), "AI service error");
}

#[tokio::test]
async fn test_search_suggestions_blank_query() {
    let app = TestApp::new().await;

    let response = app.post(SUGGEST, None, json!({ "query": " " })).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(app.llm().calls().is_empty());
}

#[tokio::test]
async fn test_ai_functions_are_rate_limited() {
    let app = TestApp::new().await;
    app.llm().reply(LlmReply::Text(r#"["rye"]"#.to_string()));

    for attempt in 0..5 {
        let response = app.post(SUGGEST, None, json!({ "query": "bread" })).await;
        assert_eq!(response.status, StatusCode::OK, "attempt {attempt}");
    }

    let limited = app.post(SUGGEST, None, json!({ "query": "bread" })).await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(app.llm().calls().len(), 5);

    // The JSON API has its own, looser budget.
    let api = app.get("/api/categories", None).await;
    assert_eq!(api.status, StatusCode::OK);
}

// =============================================================================
// push-notification
// =============================================================================

#[tokio::test]
async fn test_push_is_accepted_but_not_delivered() {
    let app = TestApp::new().await;
    let cast = seed_cast(&app.supabase);

    let response = app
        .post(
            PUSH,
            Some(VENDOR_TOKEN),
            json!({
                "user_id": cast.user,
                "title": "Fresh batch",
                "body": "Sourdough is out of the oven",
                "data": { "vendor_id": cast.vendor },
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::ACCEPTED);
    assert_eq!(
        response.body,
        json!({ "queued": false, "reason": "push delivery not configured" })
    );
}

#[tokio::test]
async fn test_push_validation() {
    let app = TestApp::new().await;
    let cast = seed_cast(&app.supabase);

    let anonymous = app
        .post(PUSH, None, json!({ "user_id": cast.user, "title": "Hi", "body": "There" }))
        .await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let blank_title = app
        .post(
            PUSH,
            Some(USER_TOKEN),
            json!({ "user_id": cast.user, "title": "  ", "body": "There" }),
        )
        .await;
    assert_eq!(blank_title.status, StatusCode::BAD_REQUEST);

    let bad_data = app
        .post(
            PUSH,
            Some(USER_TOKEN),
            json!({ "user_id": cast.user, "title": "Hi", "body": "There", "data": [1, 2] }),
        )
        .await;
    assert_eq!(bad_data.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_data.error(), "data must be a JSON object");
}
