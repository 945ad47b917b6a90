//! Request ID middleware for request tracing and correlation.
//!
//! Uses the upstream `x-request-id` when a proxy set one, otherwise a fresh
//! UUID v4. The ID is written back into the request headers (where the
//! `TraceLayer` span picks it up), tagged in Sentry and echoed in the
//! response headers.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_REQUEST_ID_LEN: usize = 128;

/// Middleware that ensures every request carries a request ID.
///
/// Upstream IDs that are empty or implausibly long are replaced.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|id| !id.is_empty() && id.len() <= MAX_REQUEST_ID_LEN)
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    let header = HeaderValue::from_str(&request_id).ok();
    if let Some(value) = header.clone() {
        request.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;

    if let Some(value) = header {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}
