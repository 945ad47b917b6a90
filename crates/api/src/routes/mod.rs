//! HTTP route handlers for the JSON API.
//!
//! # Route Structure
//!
//! ```text
//! # Identity
//! GET    /api/me                          - Caller, role, home page, shop status
//! GET    /api/gate?path=                  - Role gate decision for a SPA page
//!
//! # Vendors
//! GET    /api/vendors                     - Approved shops
//! POST   /api/vendors                     - Apply to open a shop
//! GET    /api/vendors/me                  - Caller's shop
//! PATCH  /api/vendors/me                  - Edit caller's shop
//! POST   /api/vendors/me/logo             - Upload logo (?kind=cover for cover)
//! GET    /api/vendors/me/analytics        - Dashboard analytics (approved vendor)
//! GET    /api/vendors/me/products         - Caller's products (approved vendor)
//! GET    /api/vendors/{id}                - Shop with rating summary
//! GET    /api/vendors/{id}/products       - Shop's public products
//! GET    /api/vendors/{id}/ratings        - Ratings, newest first
//! PUT    /api/vendors/{id}/ratings        - Rate a shop
//! GET    /api/vendors/{id}/ratings/summary - Count, average, distribution
//!
//! # Products
//! GET    /api/products                    - Public product list
//! POST   /api/products                    - Create (approved vendor)
//! GET    /api/products/{id}               - Product detail
//! PATCH  /api/products/{id}               - Edit own product
//! DELETE /api/products/{id}               - Delete own product
//! POST   /api/products/{id}/images        - Upload a product image
//!
//! # Shopper
//! GET    /api/categories                  - Category list (cached)
//! GET    /api/search                      - Search shops and products
//! GET    /api/saved                       - Saved shops
//! PUT    /api/saved/{vendor_id}           - Save a shop
//! DELETE /api/saved/{vendor_id}           - Unsave a shop
//! POST   /api/reports                     - Report a shop or product
//!
//! # Admin (admin role)
//! GET    /api/admin/vendors?status=       - Applications by status
//! POST   /api/admin/vendors/{id}/approve  - Approve a pending application
//! POST   /api/admin/vendors/{id}/reject   - Reject with a reason
//! POST   /api/admin/vendors/{id}/verify   - Set the verified badge
//! GET    /api/admin/reports?status=       - Reports by status
//! POST   /api/admin/reports/{id}/resolve  - Resolve an open report
//! POST   /api/admin/reports/{id}/dismiss  - Dismiss an open report
//! POST   /api/admin/categories            - Create a category
//! GET    /api/admin/stats                 - Platform counters
//!
//! # Functions
//! POST   /functions/v1/generate-description - AI product description (vendor)
//! POST   /functions/v1/enhance-image        - AI photo enhancement (vendor)
//! POST   /functions/v1/search-suggestions   - AI search suggestions
//! POST   /functions/v1/push-notification    - Push stub (authenticated)
//! ```

pub mod admin;
pub mod categories;
pub mod functions;
pub mod me;
pub mod products;
pub mod ratings;
pub mod reports;
pub mod saved;
pub mod search;
pub mod vendors;

mod upload;
mod validate;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};

use crate::ai::prompts::MAX_IMAGE_BYTES;
use crate::middleware::{ai_rate_limiter, api_rate_limiter};
use crate::state::AppState;

/// Body limit for multipart image uploads (file plus form overhead).
const UPLOAD_BODY_LIMIT: usize = upload::MAX_UPLOAD_BYTES + 1024 * 1024;

/// Body limit for `enhance-image`; base64 inflates the payload by a third.
const ENHANCE_BODY_LIMIT: usize = MAX_IMAGE_BYTES / 3 * 4 + 1024 * 1024;

/// Create the vendor routes router.
pub fn vendor_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(vendors::index).post(vendors::apply))
        .route("/me", get(vendors::mine).patch(vendors::update_mine))
        .route(
            "/me/logo",
            post(vendors::upload_logo).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/me/analytics", get(vendors::analytics))
        .route("/me/products", get(products::mine))
        .route("/{id}", get(vendors::show))
        .route("/{id}/products", get(products::for_vendor))
        .route("/{id}/ratings", get(ratings::index).put(ratings::upsert))
        .route("/{id}/ratings/summary", get(ratings::summary))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .patch(products::update)
                .delete(products::delete),
        )
        .route(
            "/{id}/images",
            post(products::upload_image).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/vendors", get(admin::vendors))
        .route("/vendors/{id}/approve", post(admin::approve))
        .route("/vendors/{id}/reject", post(admin::reject))
        .route("/vendors/{id}/verify", post(admin::verify))
        .route("/reports", get(admin::reports))
        .route("/reports/{id}/resolve", post(admin::resolve_report))
        .route("/reports/{id}/dismiss", post(admin::dismiss_report))
        .route("/categories", post(categories::create))
        .route("/stats", get(admin::stats))
}

/// Create the JSON API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(me::me))
        .route("/gate", get(me::check_gate))
        .route("/categories", get(categories::index))
        .route("/search", get(search::search))
        .route("/saved", get(saved::index))
        .route("/saved/{vendor_id}", put(saved::save).delete(saved::unsave))
        .route("/reports", post(reports::create))
        .nest("/vendors", vendor_routes())
        .nest("/products", product_routes())
        .nest("/admin", admin_routes())
}

/// Create the functions router.
///
/// The AI functions share a stricter per-IP limit than the rest of the API.
pub fn function_routes() -> Router<AppState> {
    Router::new()
        .route("/generate-description", post(functions::generate_description))
        .route(
            "/enhance-image",
            post(functions::enhance_image).layer(DefaultBodyLimit::max(ENHANCE_BODY_LIMIT)),
        )
        .route("/search-suggestions", post(functions::search_suggestions))
        .layer(ai_rate_limiter())
        .route("/push-notification", post(functions::push_notification))
}

/// Create all routes, rate limited per client IP.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api", api_routes())
        .nest("/functions/v1", function_routes())
        .layer(api_rate_limiter())
}
