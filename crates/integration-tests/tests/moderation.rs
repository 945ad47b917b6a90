//! Admin moderation of shops and reports.

use axum::http::{Method, StatusCode};
use serde_json::json;
use ushop_core::Role;
use ushop_integration_tests::{
    ADMIN_TOKEN, SERVICE_ROLE_KEY, TestApp, USER_TOKEN, VENDOR_TOKEN, seed_cast, seed_product,
    seed_vendor,
};

#[tokio::test]
async fn test_pending_queue() {
    let app = TestApp::new().await;
    seed_cast(&app.supabase);
    let owner = app.supabase.add_user("florist-token", Role::User);
    let pending = seed_vendor(&app.supabase, owner, "Quiet Florist", "pending");

    let response = app.get("/api/admin/vendors", Some(ADMIN_TOKEN)).await;
    assert_eq!(response.status, StatusCode::OK);
    let queue = response.body.as_array().cloned().unwrap_or_default();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0]["id"], pending.to_string());

    let approved = app
        .get("/api/admin/vendors?status=approved", Some(ADMIN_TOKEN))
        .await;
    assert_eq!(approved.body[0]["business_name"], "Corner Bakery");
}

#[tokio::test]
async fn test_approve_grants_vendor_role() {
    let app = TestApp::new().await;
    seed_cast(&app.supabase);
    let owner = app.supabase.add_user("florist-token", Role::User);
    let pending = seed_vendor(&app.supabase, owner, "Quiet Florist", "pending");
    app.supabase.clear_requests();

    let response = app
        .post(&format!("/api/admin/vendors/{pending}/approve"), Some(ADMIN_TOKEN), json!({}))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "approved");
    let profile = app.supabase.row("profiles", &owner).unwrap_or_default();
    assert_eq!(profile["role"], "vendor");

    let writes: Vec<_> = app
        .supabase
        .requests()
        .into_iter()
        .filter(|r| r.method == Method::PATCH)
        .collect();
    assert_eq!(writes.len(), 2);
    assert!(writes.iter().all(|r| r.bearer.as_deref() == Some(SERVICE_ROLE_KEY)));

    let me = app.get("/api/me", Some("florist-token")).await;
    assert_eq!(me.body["role"], "vendor");
    assert_eq!(me.body["home"], "/vendor/dashboard");
}

#[tokio::test]
async fn test_failed_role_grant_leaves_application_pending() {
    let app = TestApp::new().await;
    seed_cast(&app.supabase);
    let owner = app.supabase.add_user("florist-token", Role::User);
    let pending = seed_vendor(&app.supabase, owner, "Quiet Florist", "pending");
    let approve = format!("/api/admin/vendors/{pending}/approve");
    app.supabase.fail_writes("profiles");

    let failed = app.post(&approve, Some(ADMIN_TOKEN), json!({})).await;
    assert_eq!(failed.status, StatusCode::BAD_GATEWAY);
    let vendor = app.supabase.row("vendors", &pending).unwrap_or_default();
    assert_eq!(vendor["status"], "pending");
    let profile = app.supabase.row("profiles", &owner).unwrap_or_default();
    assert_eq!(profile["role"], "user");

    app.supabase.heal();
    let retried = app.post(&approve, Some(ADMIN_TOKEN), json!({})).await;
    assert_eq!(retried.status, StatusCode::OK);
    assert_eq!(retried.body["status"], "approved");

    let me = app.get("/api/me", Some("florist-token")).await;
    assert_eq!(me.body["role"], "vendor");
}

#[tokio::test]
async fn test_approving_an_admins_shop_keeps_admin_role() {
    let app = TestApp::new().await;
    let cast = seed_cast(&app.supabase);
    let shop = seed_vendor(&app.supabase, cast.admin, "Admin Test Shop", "pending");

    let response = app
        .post(&format!("/api/admin/vendors/{shop}/approve"), Some(ADMIN_TOKEN), json!({}))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let profile = app.supabase.row("profiles", &cast.admin).unwrap_or_default();
    assert_eq!(profile["role"], "admin");
}

#[tokio::test]
async fn test_decisions_apply_once() {
    let app = TestApp::new().await;
    let cast = seed_cast(&app.supabase);

    let approve = app
        .post(
            &format!("/api/admin/vendors/{}/approve", cast.vendor),
            Some(ADMIN_TOKEN),
            json!({}),
        )
        .await;
    assert_eq!(approve.status, StatusCode::CONFLICT);

    let reject = app
        .post(
            &format!("/api/admin/vendors/{}/reject", cast.vendor),
            Some(ADMIN_TOKEN),
            json!({ "reason": "Duplicate listing" }),
        )
        .await;
    assert_eq!(reject.status, StatusCode::CONFLICT);
    assert!(reject.error().contains("approved"));
}

#[tokio::test]
async fn test_reject_requires_reason() {
    let app = TestApp::new().await;
    seed_cast(&app.supabase);
    let owner = app.supabase.add_user("florist-token", Role::User);
    let pending = seed_vendor(&app.supabase, owner, "Quiet Florist", "pending");
    let uri = format!("/api/admin/vendors/{pending}/reject");

    let blank = app.post(&uri, Some(ADMIN_TOKEN), json!({ "reason": "   " })).await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);
    assert_eq!(blank.error(), "a rejection reason is required");

    let rejected = app
        .post(&uri, Some(ADMIN_TOKEN), json!({ "reason": " Photos are missing " }))
        .await;
    assert_eq!(rejected.status, StatusCode::OK);
    assert_eq!(rejected.body["status"], "rejected");
    assert_eq!(rejected.body["rejection_reason"], "Photos are missing");

    let profile = app.supabase.row("profiles", &owner).unwrap_or_default();
    assert_eq!(profile["role"], "user");
}

#[tokio::test]
async fn test_unknown_vendor_is_not_found() {
    let app = TestApp::new().await;
    seed_cast(&app.supabase);
    let missing = ushop_core::VendorId::random();

    let response = app
        .post(&format!("/api/admin/vendors/{missing}/approve"), Some(ADMIN_TOKEN), json!({}))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_verify_badge() {
    let app = TestApp::new().await;
    let cast = seed_cast(&app.supabase);
    let uri = format!("/api/admin/vendors/{}/verify", cast.vendor);

    let on = app.post(&uri, Some(ADMIN_TOKEN), json!({ "verified": true })).await;
    assert_eq!(on.status, StatusCode::OK);
    assert_eq!(on.body["is_verified"], true);

    let off = app.post(&uri, Some(ADMIN_TOKEN), json!({ "verified": false })).await;
    assert_eq!(off.body["is_verified"], false);
}

#[tokio::test]
async fn test_admin_routes_reject_other_roles() {
    let app = TestApp::new().await;
    seed_cast(&app.supabase);

    let vendor = app.get("/api/admin/stats", Some(VENDOR_TOKEN)).await;
    assert_eq!(vendor.status, StatusCode::FORBIDDEN);
    assert_eq!(vendor.body["redirect"], "/vendor/dashboard");

    let user = app.get("/api/admin/vendors", Some(USER_TOKEN)).await;
    assert_eq!(user.status, StatusCode::FORBIDDEN);
    assert_eq!(user.body["redirect"], "/");

    let anonymous = app.get("/api/admin/reports", None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Reports
// =============================================================================

#[tokio::test]
async fn test_report_lifecycle() {
    let app = TestApp::new().await;
    let cast = seed_cast(&app.supabase);

    let created = app
        .post(
            "/api/reports",
            Some(USER_TOKEN),
            json!({
                "vendor_id": cast.vendor,
                "reason": "spam",
                "details": "Posts the same listing every hour",
            }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["status"], "open");
    assert_eq!(created.body["reporter_id"], cast.user.to_string());
    let id = created.body["id"].as_str().unwrap_or_default().to_string();

    let open = app.get("/api/admin/reports", Some(ADMIN_TOKEN)).await;
    assert_eq!(open.body.as_array().map(Vec::len), Some(1));

    let resolved = app
        .post(&format!("/api/admin/reports/{id}/resolve"), Some(ADMIN_TOKEN), json!({}))
        .await;
    assert_eq!(resolved.status, StatusCode::OK);
    assert_eq!(resolved.body["status"], "resolved");
    assert_eq!(resolved.body["resolved_by"], cast.admin.to_string());

    let again = app
        .post(&format!("/api/admin/reports/{id}/dismiss"), Some(ADMIN_TOKEN), json!({}))
        .await;
    assert_eq!(again.status, StatusCode::CONFLICT);
    assert_eq!(again.error(), "report is already resolved");

    let still_open = app.get("/api/admin/reports", Some(ADMIN_TOKEN)).await;
    assert_eq!(still_open.body.as_array().map(Vec::len), Some(0));
    let closed = app
        .get("/api/admin/reports?status=resolved", Some(ADMIN_TOKEN))
        .await;
    assert_eq!(closed.body.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_report_product_must_belong_to_shop() {
    let app = TestApp::new().await;
    let cast = seed_cast(&app.supabase);
    let owner = app.supabase.add_user("dairy-token", Role::Vendor);
    let dairy = seed_vendor(&app.supabase, owner, "Alpine Dairy", "approved");
    let cheese = seed_product(&app.supabase, dairy, "Cheese", "8.00", None);

    let mismatched = app
        .post(
            "/api/reports",
            Some(USER_TOKEN),
            json!({ "vendor_id": cast.vendor, "product_id": cheese["id"], "reason": "counterfeit" }),
        )
        .await;
    assert_eq!(mismatched.status, StatusCode::NOT_FOUND);
    assert_eq!(mismatched.error(), "Product not found");

    let matched = app
        .post(
            "/api/reports",
            Some(USER_TOKEN),
            json!({ "vendor_id": dairy, "product_id": cheese["id"], "reason": "counterfeit" }),
        )
        .await;
    assert_eq!(matched.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_report_validation() {
    let app = TestApp::new().await;
    let cast = seed_cast(&app.supabase);

    let anonymous = app
        .post("/api/reports", None, json!({ "vendor_id": cast.vendor, "reason": "spam" }))
        .await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let unknown_reason = app
        .post(
            "/api/reports",
            Some(USER_TOKEN),
            json!({ "vendor_id": cast.vendor, "reason": "boring" }),
        )
        .await;
    assert_eq!(unknown_reason.status, StatusCode::UNPROCESSABLE_ENTITY);

    let missing_shop = app
        .post(
            "/api/reports",
            Some(USER_TOKEN),
            json!({ "vendor_id": ushop_core::VendorId::random(), "reason": "spam" }),
        )
        .await;
    assert_eq!(missing_shop.status, StatusCode::NOT_FOUND);
    assert!(app.supabase.rows("reports").is_empty());
}

#[tokio::test]
async fn test_platform_stats() {
    let app = TestApp::new().await;
    let cast = seed_cast(&app.supabase);
    let owner = app.supabase.add_user("florist-token", Role::User);
    seed_vendor(&app.supabase, owner, "Quiet Florist", "pending");
    seed_product(&app.supabase, cast.vendor, "Rye", "4.00", None);
    app.supabase.insert(
        "reports",
        json!({
            "reporter_id": cast.user,
            "vendor_id": cast.vendor,
            "reason": "other",
            "status": "open",
        }),
    );

    let response = app.get("/api/admin/stats", Some(ADMIN_TOKEN)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body,
        json!({
            "vendors_pending": 1,
            "vendors_approved": 1,
            "vendors_rejected": 0,
            "products": 1,
            "open_reports": 1,
        })
    );
}
