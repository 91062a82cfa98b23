use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier used for RBAC.
///
/// Roles are opaque strings at this layer; [`crate::RolePolicy`] maps them to
/// permissions and decides which ones are privileged (tenant-unrestricted).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));
    pub const SUPER_ADMIN: Role = Role(Cow::Borrowed("super-admin"));
    pub const MANAGER: Role = Role(Cow::Borrowed("manager"));
    pub const WAREHOUSE: Role = Role(Cow::Borrowed("warehouse"));
    pub const PRODUCTION: Role = Role(Cow::Borrowed("production"));
    pub const SALES: Role = Role(Cow::Borrowed("sales"));
    pub const VIEWER: Role = Role(Cow::Borrowed("viewer"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
