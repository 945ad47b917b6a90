//! HTTP middleware stack for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. Request ID
//! 3. `TraceLayer` (request tracing)
//! 4. CORS
//! 5. Rate limiting (governor), per route group
//!
//! Authentication is not a layer: handlers opt in through the extractors in
//! [`auth`].

pub mod auth;
pub mod rate_limit;
pub mod request_id;

pub use auth::{AuthRejection, Caller, OptionalUser, RequireAdmin, RequireUser, RequireVendor};
pub use rate_limit::{ai_rate_limiter, api_rate_limiter};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
