//! User profiles (role source for the role gate).

use serde::{Deserialize, Serialize};
use ushop_core::{Role, UserId};

/// A row in `profiles`. `id` equals the auth user ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    /// Raw stored role; read through [`Profile::role`].
    #[serde(default)]
    pub role: Option<String>,
}

impl Profile {
    /// Effective role, `user` when missing or unrecognized.
    #[must_use]
    pub fn role(&self) -> Role {
        Role::from_stored(self.role.as_deref())
    }
}
