//! Shop ratings and saved shops.

use axum::http::StatusCode;
use serde_json::json;
use ushop_core::Role;
use ushop_integration_tests::{
    TestApp, USER_TOKEN, VENDOR_TOKEN, seed_cast, seed_rating, seed_vendor,
};

// =============================================================================
// Ratings
// =============================================================================

#[tokio::test]
async fn test_rating_is_one_per_user() {
    let app = TestApp::new().await;
    let cast = seed_cast(&app.supabase);
    let uri = format!("/api/vendors/{}/ratings", cast.vendor);

    let first = app
        .put(&uri, Some(USER_TOKEN), Some(json!({ "score": 5, "comment": "Best rye in town" })))
        .await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["score"], 5);
    assert_eq!(first.body["user_id"], cast.user.to_string());

    let second = app
        .put(&uri, Some(USER_TOKEN), Some(json!({ "score": 3 })))
        .await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.body["score"], 3);

    let rows = app.supabase.rows("ratings");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["score"], 3);

    let listed = app.get(&uri, None).await;
    assert_eq!(listed.body.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_owner_cannot_rate_own_shop() {
    let app = TestApp::new().await;
    let cast = seed_cast(&app.supabase);

    let response = app
        .put(
            &format!("/api/vendors/{}/ratings", cast.vendor),
            Some(VENDOR_TOKEN),
            Some(json!({ "score": 5 })),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error(), "You cannot rate your own shop");
    assert!(app.supabase.rows("ratings").is_empty());
}

#[tokio::test]
async fn test_rating_validation() {
    let app = TestApp::new().await;
    let cast = seed_cast(&app.supabase);
    let uri = format!("/api/vendors/{}/ratings", cast.vendor);

    for score in [0, 6, -1] {
        let response = app
            .put(&uri, Some(USER_TOKEN), Some(json!({ "score": score })))
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "score {score}");
    }

    let anonymous = app.put(&uri, None, Some(json!({ "score": 4 }))).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unapproved_shops_cannot_be_rated() {
    let app = TestApp::new().await;
    seed_cast(&app.supabase);
    let owner = app.supabase.add_user("florist-token", Role::User);
    let pending = seed_vendor(&app.supabase, owner, "Quiet Florist", "pending");

    let rate = app
        .put(
            &format!("/api/vendors/{pending}/ratings"),
            Some(USER_TOKEN),
            Some(json!({ "score": 4 })),
        )
        .await;
    assert_eq!(rate.status, StatusCode::NOT_FOUND);

    let summary = app
        .get(&format!("/api/vendors/{pending}/ratings/summary"), None)
        .await;
    assert_eq!(summary.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rating_summary() {
    let app = TestApp::new().await;
    let cast = seed_cast(&app.supabase);
    for score in [5, 5, 4, 2] {
        seed_rating(&app.supabase, cast.vendor, score);
    }

    let response = app
        .get(&format!("/api/vendors/{}/ratings/summary", cast.vendor), None)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["count"], 4);
    assert_eq!(response.body["average"], 4.0);
    assert_eq!(response.body["distribution"], json!([0, 1, 0, 1, 2]));
}

#[tokio::test]
async fn test_empty_summary() {
    let app = TestApp::new().await;
    let cast = seed_cast(&app.supabase);

    let response = app
        .get(&format!("/api/vendors/{}/ratings/summary", cast.vendor), None)
        .await;

    assert_eq!(response.body["count"], 0);
    assert_eq!(response.body["distribution"], json!([0, 0, 0, 0, 0]));
}

// =============================================================================
// Saved shops
// =============================================================================

#[tokio::test]
async fn test_save_and_unsave_are_idempotent() {
    let app = TestApp::new().await;
    let cast = seed_cast(&app.supabase);
    let uri = format!("/api/saved/{}", cast.vendor);

    for _ in 0..2 {
        let saved = app.put(&uri, Some(USER_TOKEN), None).await;
        assert_eq!(saved.status, StatusCode::OK);
        assert_eq!(saved.body["vendor_id"], cast.vendor.to_string());
    }
    assert_eq!(app.supabase.rows("saved_shops").len(), 1);

    let listed = app.get("/api/saved", Some(USER_TOKEN)).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body.as_array().map(Vec::len), Some(1));
    assert_eq!(listed.body[0]["vendors"]["business_name"], "Corner Bakery");

    for _ in 0..2 {
        let removed = app.delete(&uri, Some(USER_TOKEN)).await;
        assert_eq!(removed.status, StatusCode::NO_CONTENT);
    }
    assert!(app.supabase.rows("saved_shops").is_empty());
}

#[tokio::test]
async fn test_saved_shops_are_per_user() {
    let app = TestApp::new().await;
    let cast = seed_cast(&app.supabase);

    app.put(&format!("/api/saved/{}", cast.vendor), Some(USER_TOKEN), None)
        .await;

    let other = app.get("/api/saved", Some(VENDOR_TOKEN)).await;
    assert_eq!(other.body.as_array().map(Vec::len), Some(0));

    let writes = app.supabase.table_requests("saved_shops");
    assert!(
        writes
            .iter()
            .all(|r| r.bearer.as_deref() != Some(ushop_integration_tests::SERVICE_ROLE_KEY))
    );
}

#[tokio::test]
async fn test_cannot_save_unapproved_shop() {
    let app = TestApp::new().await;
    seed_cast(&app.supabase);
    let owner = app.supabase.add_user("florist-token", Role::User);
    let pending = seed_vendor(&app.supabase, owner, "Quiet Florist", "pending");

    let response = app
        .put(&format!("/api/saved/{pending}"), Some(USER_TOKEN), None)
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_saved_requires_sign_in() {
    let app = TestApp::new().await;
    let response = app.get("/api/saved", None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}
