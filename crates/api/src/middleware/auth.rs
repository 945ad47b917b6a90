//! Authentication extractors backed by Supabase auth.
//!
//! The caller is identified by `Authorization: Bearer <access token>`. The
//! token is resolved through GoTrue and the role read from `profiles`. The
//! result is stored in request extensions, so stacking extractors costs one
//! lookup.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use tracing::debug;
use ushop_core::{Role, UserId, VendorStatus};

use crate::db::{ProfileRepository, VendorRepository};
use crate::error::{AppError, set_sentry_user};
use crate::models::Vendor;
use crate::state::AppState;
use crate::supabase::{Auth, AuthUser, SupabaseError};

/// A signed-in caller.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user: AuthUser,
    pub role: Role,
    token: String,
}

impl Caller {
    /// The caller's user ID.
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.user.id
    }

    /// Credential for Supabase calls made on the caller's behalf.
    #[must_use]
    pub fn auth(&self) -> Auth<'_> {
        Auth::User(&self.token)
    }
}

#[derive(Clone)]
struct ResolvedCaller(Option<Caller>);

/// Error returned when an extractor rejects the caller.
#[derive(Debug)]
pub enum AuthRejection {
    /// No token, or the token is invalid or expired.
    Unauthorized,
    /// Signed in with a role that cannot use this endpoint.
    WrongRole(Role),
    /// Vendor role but no approved shop.
    VendorNotApproved(Option<VendorStatus>),
    /// Resolving the caller failed upstream.
    Upstream(AppError),
}

impl From<AuthRejection> for AppError {
    fn from(rejection: AuthRejection) -> Self {
        match rejection {
            AuthRejection::Unauthorized => Self::Unauthorized("Sign in required".to_string()),
            AuthRejection::WrongRole(role) => Self::Forbidden {
                message: "Your account cannot access this resource".to_string(),
                redirect: Some(role.home().to_string()),
            },
            AuthRejection::VendorNotApproved(status) => Self::Forbidden {
                message: match status {
                    Some(status) => format!("Vendor application is {status}"),
                    None => "No vendor application found".to_string(),
                },
                redirect: Some("/vendor/register".to_string()),
            },
            AuthRejection::Upstream(err) => err,
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolve (once per request) the caller behind the bearer token.
///
/// Invalid or expired tokens resolve to `None`.
async fn resolve(parts: &mut Parts, state: &AppState) -> Result<Option<Caller>, AppError> {
    if let Some(ResolvedCaller(caller)) = parts.extensions.get::<ResolvedCaller>() {
        return Ok(caller.clone());
    }

    let caller = match bearer_token(parts) {
        None => None,
        Some(token) => match state.supabase().get_user(token).await {
            Ok(user) => {
                let profile = ProfileRepository::new(state.supabase())
                    .get(user.id, Auth::User(token))
                    .await?;
                let role = profile.map(|p| p.role()).unwrap_or_default();
                set_sentry_user(&user.id, user.email.as_deref());
                Some(Caller {
                    user,
                    role,
                    token: token.to_string(),
                })
            }
            Err(SupabaseError::Unauthorized(reason) | SupabaseError::Forbidden(reason)) => {
                debug!(reason = %reason, "Rejected access token");
                None
            }
            Err(e) => return Err(e.into()),
        },
    };

    parts.extensions.insert(ResolvedCaller(caller.clone()));
    Ok(caller)
}

/// Extractor that optionally gets the current caller.
///
/// Unlike `RequireUser`, this does not reject signed-out requests.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(OptionalUser(caller): OptionalUser) -> impl IntoResponse {
///     match caller {
///         Some(c) => format!("Hello, {}!", c.id()),
///         None => "Hello, guest!".to_string(),
///     }
/// }
/// ```
pub struct OptionalUser(pub Option<Caller>);

impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve(parts, state)
            .await
            .map(Self)
            .map_err(AuthRejection::Upstream)
    }
}

/// Extractor that requires a signed-in caller.
pub struct RequireUser(pub Caller);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve(parts, state)
            .await
            .map_err(AuthRejection::Upstream)?
            .map(Self)
            .ok_or(AuthRejection::Unauthorized)
    }
}

/// Extractor that requires an admin.
pub struct RequireAdmin(pub Caller);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireUser(caller) = RequireUser::from_request_parts(parts, state).await?;
        if caller.role != Role::Admin {
            return Err(AuthRejection::WrongRole(caller.role));
        }
        Ok(Self(caller))
    }
}

/// Extractor that requires the vendor role and an approved shop.
///
/// # Example
///
/// ```rust,ignore
/// async fn dashboard(RequireVendor { vendor, .. }: RequireVendor) -> impl IntoResponse {
///     format!("Welcome back, {}!", vendor.business_name)
/// }
/// ```
pub struct RequireVendor {
    pub caller: Caller,
    pub vendor: Vendor,
}

impl FromRequestParts<AppState> for RequireVendor {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireUser(caller) = RequireUser::from_request_parts(parts, state).await?;
        if !caller.role.satisfies(Role::Vendor) {
            return Err(AuthRejection::WrongRole(caller.role));
        }

        let vendor = VendorRepository::new(state.supabase())
            .get_by_owner(caller.id(), caller.auth())
            .await
            .map_err(|e| AuthRejection::Upstream(e.into()))?;
        match vendor {
            Some(vendor) if vendor.status == VendorStatus::Approved => {
                Ok(Self { caller, vendor })
            }
            other => Err(AuthRejection::VendorNotApproved(other.map(|v| v.status))),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(auth: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/me");
        if let Some(value) = auth {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&parts(Some("Bearer abc.def"))), Some("abc.def"));
        assert_eq!(bearer_token(&parts(Some("bearer  xyz "))), Some("xyz"));
        assert_eq!(bearer_token(&parts(Some("Basic Zm9v"))), None);
        assert_eq!(bearer_token(&parts(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts(None)), None);
    }

    #[test]
    fn test_wrong_role_redirects_home() {
        let err = AppError::from(AuthRejection::WrongRole(Role::Vendor));
        match err {
            AppError::Forbidden { redirect, .. } => {
                assert_eq!(redirect.as_deref(), Some("/vendor/dashboard"));
            }
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn test_unapproved_vendor_message_names_status() {
        let err = AppError::from(AuthRejection::VendorNotApproved(Some(VendorStatus::Pending)));
        assert!(err.to_string().contains("pending"));
    }
}
