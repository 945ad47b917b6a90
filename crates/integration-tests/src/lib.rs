//! Integration tests for uShop.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p ushop-integration-tests
//! ```
//!
//! No external services are needed. [`TestApp`] starts a fake Supabase
//! project and a fake LLM gateway as in-process axum servers on ephemeral
//! ports, points a real [`ushop_api::app`] router at them and drives it with
//! `tower::ServiceExt::oneshot`.
//!
//! # Example
//!
//! ```rust,ignore
//! let app = TestApp::new().await;
//! let owner = app.supabase.add_user("owner-token", Role::User);
//! let response = app.get("/api/vendors", None).await;
//! assert_eq!(response.status, StatusCode::OK);
//! ```

pub mod fake_llm;
pub mod fake_supabase;

use std::net::{IpAddr, Ipv4Addr};

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;
use ushop_api::config::{ApiConfig, LlmConfig, SupabaseConfig};
use ushop_api::state::AppState;
use ushop_core::{UserId, VendorId};

pub use fake_llm::{FakeLlm, LlmReply};
pub use fake_supabase::{FakeSupabase, RecordedRequest, SERVICE_ROLE_KEY};

/// Client address sent in `x-forwarded-for`, so the rate limiter has a key.
pub const CLIENT_IP: &str = "203.0.113.7";

/// A response body with its status and headers.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Parsed JSON, or the raw text as a JSON string when not JSON.
    pub body: Value,
}

impl TestResponse {
    /// The `error` message of an error body.
    #[must_use]
    pub fn error(&self) -> &str {
        self.body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

/// The API under test, wired to fake upstreams.
pub struct TestApp {
    router: Router,
    pub supabase: FakeSupabase,
    pub llm: Option<FakeLlm>,
}

impl TestApp {
    /// An app with both fakes running.
    pub async fn new() -> Self {
        let supabase = FakeSupabase::start().await;
        let llm = FakeLlm::start().await;
        Self::build(supabase, Some(llm))
    }

    /// An app with no LLM gateway configured.
    pub async fn without_llm() -> Self {
        Self::build(FakeSupabase::start().await, None)
    }

    fn build(supabase: FakeSupabase, llm: Option<FakeLlm>) -> Self {
        let config = ApiConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            cors_origins: vec!["http://localhost:5173".to_string()],
            supabase: SupabaseConfig {
                url: supabase.url().to_string(),
                anon_key: fake_supabase::ANON_KEY.to_string(),
                service_role_key: SecretString::from(SERVICE_ROLE_KEY),
            },
            llm: llm.as_ref().map(|llm| LlmConfig {
                gateway_url: llm.url().to_string(),
                api_key: SecretString::from(fake_llm::LLM_API_KEY),
                model: "test/text-model".to_string(),
                image_model: "test/image-model".to_string(),
            }),
            sentry_dsn: None,
            sentry_environment: None,
        };
        Self {
            router: ushop_api::app(AppState::new(config)),
            supabase,
            llm,
        }
    }

    /// The fake gateway; panics when the app was built without one.
    #[must_use]
    pub fn llm(&self) -> &FakeLlm {
        self.llm.as_ref().expect("TestApp was built without an LLM gateway")
    }

    /// Send a request with an optional bearer token and JSON body.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", CLIENT_IP);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");
        self.send(request).await
    }

    /// Send a prepared request.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Option<Value>) -> TestResponse {
        self.request(Method::PUT, uri, token, body).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::PATCH, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// Upload `bytes` as the `file` field of a multipart form.
    pub async fn upload(
        &self,
        uri: &str,
        token: &str,
        filename: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> TestResponse {
        let boundary = "ushop-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("x-forwarded-for", CLIENT_IP)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .expect("Failed to build upload request");
        self.send(request).await
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// Insert a shop owned by `owner` in `status` and return its ID.
pub fn seed_vendor(supabase: &FakeSupabase, owner: UserId, name: &str, status: &str) -> VendorId {
    let row = supabase.insert(
        "vendors",
        json!({
            "owner_id": owner,
            "business_name": name,
            "description": format!("{name} sells local goods"),
            "status": status,
            "is_verified": false,
        }),
    );
    serde_json::from_value(row.get("id").cloned().unwrap_or_default())
        .expect("Seeded vendor has an id")
}

/// Insert a product and return the stored row.
pub fn seed_product(
    supabase: &FakeSupabase,
    vendor: VendorId,
    name: &str,
    price_min: &str,
    price_max: Option<&str>,
) -> Value {
    supabase.insert(
        "products",
        json!({
            "vendor_id": vendor,
            "name": name,
            "description": format!("Fresh {name}"),
            "price_min": price_min,
            "price_max": price_max,
            "images": [],
            "category_id": null,
            "is_available": true,
        }),
    )
}

/// Insert a rating of `vendor` by a fresh user.
pub fn seed_rating(supabase: &FakeSupabase, vendor: VendorId, score: u8) -> Value {
    supabase.insert(
        "ratings",
        json!({
            "vendor_id": vendor,
            "user_id": UserId::random(),
            "score": score,
            "comment": null,
        }),
    )
}

/// A user token, a vendor token with an approved shop, and an admin token.
pub struct Cast {
    pub user: UserId,
    pub vendor_owner: UserId,
    pub vendor: VendorId,
    pub admin: UserId,
}

pub const USER_TOKEN: &str = "user-token";
pub const VENDOR_TOKEN: &str = "vendor-token";
pub const ADMIN_TOKEN: &str = "admin-token";

/// Seed the usual three accounts.
pub fn seed_cast(supabase: &FakeSupabase) -> Cast {
    use ushop_core::Role;

    let user = supabase.add_user(USER_TOKEN, Role::User);
    let vendor_owner = supabase.add_user(VENDOR_TOKEN, Role::Vendor);
    let admin = supabase.add_user(ADMIN_TOKEN, Role::Admin);
    let vendor = seed_vendor(supabase, vendor_owner, "Corner Bakery", "approved");
    Cast {
        user,
        vendor_owner,
        vendor,
        admin,
    }
}
