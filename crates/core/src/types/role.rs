//! User roles used by the role gate.

use serde::{Deserialize, Serialize};

/// Role stored in `profiles.role`.
///
/// Every signed-in account has exactly one role. Vendors get their role when
/// an admin approves their shop application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Platform moderator. Passes every role check.
    Admin,
    /// Owner of an approved shop.
    Vendor,
    /// Regular consumer account.
    #[default]
    User,
}

impl Role {
    /// Landing page for this role.
    ///
    /// The role gate redirects callers here when they hit a page their role
    /// cannot see.
    #[must_use]
    pub const fn home(self) -> &'static str {
        match self {
            Self::Admin => "/admin",
            Self::Vendor => "/vendor/dashboard",
            Self::User => "/",
        }
    }

    /// Whether a caller holding `self` satisfies a check for `required`.
    #[must_use]
    pub const fn satisfies(self, required: Self) -> bool {
        matches!(
            (self, required),
            (Self::Admin, _) | (Self::Vendor, Self::Vendor | Self::User) | (Self::User, Self::User)
        )
    }

    /// Parse a stored role, falling back to [`Role::User`] for unknown values.
    #[must_use]
    pub fn from_stored(value: Option<&str>) -> Self {
        value.and_then(|s| s.parse().ok()).unwrap_or_default()
    }

    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Vendor => "vendor",
            Self::User => "user",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "vendor" => Ok(Self::Vendor),
            "user" => Ok(Self::User),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_satisfies_everything() {
        assert!(Role::Admin.satisfies(Role::Admin));
        assert!(Role::Admin.satisfies(Role::Vendor));
        assert!(Role::Admin.satisfies(Role::User));
    }

    #[test]
    fn test_user_cannot_reach_vendor_or_admin() {
        assert!(!Role::User.satisfies(Role::Vendor));
        assert!(!Role::User.satisfies(Role::Admin));
        assert!(!Role::Vendor.satisfies(Role::Admin));
    }

    #[test]
    fn test_unknown_stored_role_is_user() {
        assert_eq!(Role::from_stored(Some("superuser")), Role::User);
        assert_eq!(Role::from_stored(None), Role::User);
        assert_eq!(Role::from_stored(Some("vendor")), Role::Vendor);
    }

    #[test]
    fn test_home_paths() {
        assert_eq!(Role::Admin.home(), "/admin");
        assert_eq!(Role::Vendor.home(), "/vendor/dashboard");
        assert_eq!(Role::User.home(), "/");
    }
}
