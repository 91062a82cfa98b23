use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stockledger_core::TenantId;

use crate::Role;

/// Identity of an authenticated principal (human user, service account, etc).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(Uuid);

impl PrincipalId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PrincipalId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for PrincipalId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// The caller of a ledger or workflow operation, as described by the auth layer.
///
/// `tenant_id` is `None` for platform-level accounts; such an actor only gets
/// access through a privileged role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub principal_id: PrincipalId,
    pub roles: Vec<Role>,
    pub tenant_id: Option<TenantId>,
}

impl Actor {
    /// An actor bound to one tenant.
    pub fn scoped(tenant_id: TenantId, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            principal_id: PrincipalId::new(),
            roles: roles.into_iter().collect(),
            tenant_id: Some(tenant_id),
        }
    }

    /// An actor without a tenant (platform account).
    pub fn unscoped(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            principal_id: PrincipalId::new(),
            roles: roles.into_iter().collect(),
            tenant_id: None,
        }
    }
}
