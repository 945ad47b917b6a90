//! Role gate: which pages a caller may open, and where to send them if not.
//!
//! The SPA asks `GET /api/gate?path=...` before rendering a protected page.
//! The same rules back the API extractors in [`crate::middleware::auth`].

use serde::Serialize;
use ushop_core::Role;

use crate::error::SIGN_IN_PATH;

/// What a page requires of its visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Anyone.
    Public,
    /// Any signed-in account.
    Authenticated,
    /// A signed-in account whose role satisfies this one.
    Role(Role),
}

/// Outcome of a gate check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "redirect", rename_all = "snake_case")]
pub enum GateDecision {
    Allow,
    Redirect(String),
}

/// Decide whether a caller with `role` (`None` when signed out) may pass.
///
/// Signed-out callers go to the sign-in page; signed-in callers with the
/// wrong role go to their own home page. Admins pass every role check.
#[must_use]
pub fn gate(required: Access, role: Option<Role>) -> GateDecision {
    match (required, role) {
        (Access::Public, _) => GateDecision::Allow,
        (_, None) => GateDecision::Redirect(SIGN_IN_PATH.to_string()),
        (Access::Authenticated, Some(_)) => GateDecision::Allow,
        (Access::Role(required), Some(role)) if role.satisfies(required) => GateDecision::Allow,
        (Access::Role(_), Some(role)) => GateDecision::Redirect(role.home().to_string()),
    }
}

/// Access rule for a SPA page path.
#[must_use]
pub fn access_for_path(path: &str) -> Access {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let path = match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };

    if under(path, "/admin") {
        Access::Role(Role::Admin)
    } else if path == "/vendor/register" || under(path, "/profile") || under(path, "/saved") {
        Access::Authenticated
    } else if under(path, "/vendor") {
        Access::Role(Role::Vendor)
    } else {
        Access::Public
    }
}

fn under(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}
