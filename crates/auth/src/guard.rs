//! Tenant access guard.
//!
//! One entry point, [`TenantAccessGuard::resolve`], turns an actor and a requested
//! operation into an [`AccessDecision`]. Callers apply the decision to every read
//! and write they perform; there is no second code path that answers "is this
//! allowed" differently.
//!
//! Deny policy: a [`AccessDecision::Denied`] always surfaces as an [`AuthzError`].
//! It is never converted into an empty result set.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use stockledger_core::{DomainError, TenantId};

use crate::{Actor, Permission, Role};

/// Operations exposed by the ledger and its workflows.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Operation {
    ReadLedger,
    AppendTransaction,
    DeleteTransaction,
    ReconcileStock,
    WriteCatalog,
    ReceivePurchaseOrder,
    WritePurchaseOrder,
    WriteProductionRun,
    WriteOrder,
}

impl Operation {
    pub fn required_permission(&self) -> Permission {
        Permission::new(match self {
            Operation::ReadLedger => "inventory.transactions.read",
            Operation::AppendTransaction => "inventory.transactions.write",
            Operation::DeleteTransaction => "inventory.transactions.delete",
            Operation::ReconcileStock => "inventory.stock.reconcile",
            Operation::WriteCatalog => "inventory.catalog.write",
            Operation::ReceivePurchaseOrder => "purchasing.orders.receive",
            Operation::WritePurchaseOrder => "purchasing.orders.write",
            Operation::WriteProductionRun => "production.runs.write",
            Operation::WriteOrder => "sales.orders.write",
        })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("actor is not bound to a tenant")]
    NoTenant,

    #[error("tenant mismatch: actor is scoped to {scoped}, target is {target}")]
    TenantMismatch { scoped: TenantId, target: TenantId },

    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

impl From<AuthzError> for DomainError {
    fn from(value: AuthzError) -> Self {
        DomainError::unauthorized(value.to_string())
    }
}

/// Outcome of resolving an actor against an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// Privileged actor: no tenant restriction.
    Unrestricted,
    /// Access refused outright.
    Denied(AuthzError),
    /// Access limited to rows where `tenant == .0`.
    ScopedBy(TenantId),
}

impl AccessDecision {
    /// Authorize a read or write that targets `target`.
    pub fn authorize_tenant(&self, target: TenantId) -> Result<(), AuthzError> {
        match self {
            AccessDecision::Unrestricted => Ok(()),
            AccessDecision::Denied(err) => Err(err.clone()),
            AccessDecision::ScopedBy(scoped) if *scoped == target => Ok(()),
            AccessDecision::ScopedBy(scoped) => Err(AuthzError::TenantMismatch {
                scoped: *scoped,
                target,
            }),
        }
    }

    /// Resolve the tenant filter for a query.
    ///
    /// `Ok(None)` means "all tenants" and is only produced for unrestricted actors.
    /// A scoped actor that names another tenant gets an error, not an empty filter.
    pub fn tenant_filter(&self, requested: Option<TenantId>) -> Result<Option<TenantId>, AuthzError> {
        match (self, requested) {
            (AccessDecision::Unrestricted, requested) => Ok(requested),
            (AccessDecision::Denied(err), _) => Err(err.clone()),
            (AccessDecision::ScopedBy(scoped), None) => Ok(Some(*scoped)),
            (AccessDecision::ScopedBy(_), Some(target)) => {
                self.authorize_tenant(target)?;
                Ok(Some(target))
            }
        }
    }

    /// Row-level predicate form of the decision.
    pub fn admits(&self, tenant_id: TenantId) -> bool {
        self.authorize_tenant(tenant_id).is_ok()
    }
}

/// Role → permission mapping plus the set of privileged (tenant-unrestricted) roles.
#[derive(Debug, Clone)]
pub struct RolePolicy {
    privileged: HashSet<Role>,
    grants: HashMap<Role, Vec<Permission>>,
}

impl RolePolicy {
    /// An empty policy: nobody is privileged, no role grants anything.
    pub fn empty() -> Self {
        Self {
            privileged: HashSet::new(),
            grants: HashMap::new(),
        }
    }

    /// The built-in role set.
    pub fn standard() -> Self {
        let read = Operation::ReadLedger.required_permission();
        let write = Operation::AppendTransaction.required_permission();

        Self::empty()
            .with_privileged_roles([Role::ADMIN, Role::SUPER_ADMIN])
            .grant(
                Role::MANAGER,
                [
                    Operation::ReadLedger,
                    Operation::AppendTransaction,
                    Operation::ReconcileStock,
                    Operation::WriteCatalog,
                    Operation::ReceivePurchaseOrder,
                    Operation::WritePurchaseOrder,
                    Operation::WriteProductionRun,
                    Operation::WriteOrder,
                ]
                .iter()
                .map(Operation::required_permission),
            )
            .grant(
                Role::WAREHOUSE,
                [
                    read.clone(),
                    write,
                    Operation::ReceivePurchaseOrder.required_permission(),
                ],
            )
            .grant(
                Role::PRODUCTION,
                [read.clone(), Operation::WriteProductionRun.required_permission()],
            )
            .grant(Role::SALES, [read.clone(), Operation::WriteOrder.required_permission()])
            .grant(Role::VIEWER, [read])
    }

    /// Replace the privileged role set.
    pub fn with_privileged_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.privileged = roles.into_iter().collect();
        self
    }

    pub fn grant(mut self, role: Role, permissions: impl IntoIterator<Item = Permission>) -> Self {
        self.grants.entry(role).or_default().extend(permissions);
        self
    }

    pub fn is_privileged(&self, role: &Role) -> bool {
        self.privileged.contains(role)
    }

    pub fn permissions_for(&self, role: &Role) -> &[Permission] {
        self.grants.get(role).map(Vec::as_slice).unwrap_or(&[])
    }

    fn role_grants(&self, role: &Role, required: &Permission) -> bool {
        self.permissions_for(role).iter().any(|p| p.grants(required))
    }
}

impl Default for RolePolicy {
    fn default() -> Self {
        Self::standard()
    }
}

/// Resolves actors into access decisions.
#[derive(Debug, Clone, Default)]
pub struct TenantAccessGuard {
    policy: RolePolicy,
}

impl TenantAccessGuard {
    pub fn new(policy: RolePolicy) -> Self {
        Self { policy }
    }

    /// Resolve `actor` for `operation`.
    ///
    /// - No IO
    /// - No panics
    pub fn resolve(&self, actor: &Actor, operation: Operation) -> AccessDecision {
        if actor.roles.iter().any(|r| self.policy.is_privileged(r)) {
            return AccessDecision::Unrestricted;
        }

        let tenant_id = match actor.tenant_id {
            Some(t) if !t.is_nil() => t,
            _ => {
                tracing::debug!(principal_id = %actor.principal_id, ?operation, "denied: no tenant");
                return AccessDecision::Denied(AuthzError::NoTenant);
            }
        };

        let required = operation.required_permission();
        if actor.roles.iter().any(|r| self.policy.role_grants(r, &required)) {
            AccessDecision::ScopedBy(tenant_id)
        } else {
            tracing::debug!(
                principal_id = %actor.principal_id,
                tenant_id = %tenant_id,
                permission = %required,
                "denied: missing permission"
            );
            AccessDecision::Denied(AuthzError::Forbidden(required.as_str().to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use uuid::Uuid;

    fn guard() -> TenantAccessGuard {
        TenantAccessGuard::default()
    }

    #[test]
    fn admin_is_unrestricted_with_or_without_tenant() {
        let with_tenant = Actor::scoped(TenantId::new(), [Role::ADMIN]);
        let without_tenant = Actor::unscoped([Role::SUPER_ADMIN]);

        assert_eq!(guard().resolve(&with_tenant, Operation::DeleteTransaction), AccessDecision::Unrestricted);
        assert_eq!(guard().resolve(&without_tenant, Operation::ReadLedger), AccessDecision::Unrestricted);
    }

    #[test]
    fn non_privileged_actor_without_tenant_is_denied() {
        let actor = Actor::unscoped([Role::MANAGER]);
        assert_eq!(
            guard().resolve(&actor, Operation::ReadLedger),
            AccessDecision::Denied(AuthzError::NoTenant)
        );
    }

    #[test]
    fn nil_tenant_counts_as_no_tenant() {
        let actor = Actor::scoped(TenantId::from_uuid(Uuid::nil()), [Role::MANAGER]);
        assert_eq!(
            guard().resolve(&actor, Operation::ReadLedger),
            AccessDecision::Denied(AuthzError::NoTenant)
        );
    }

    #[test]
    fn tenant_role_is_scoped_to_its_tenant() {
        let t1 = TenantId::new();
        let t2 = TenantId::new();
        let actor = Actor::scoped(t1, [Role::WAREHOUSE]);

        let decision = guard().resolve(&actor, Operation::ReadLedger);
        assert_eq!(decision, AccessDecision::ScopedBy(t1));
        assert!(decision.authorize_tenant(t1).is_ok());
        assert_eq!(
            decision.authorize_tenant(t2),
            Err(AuthzError::TenantMismatch { scoped: t1, target: t2 })
        );
    }

    #[test]
    fn scoped_query_naming_another_tenant_is_rejected_not_emptied() {
        let t1 = TenantId::new();
        let t2 = TenantId::new();
        let decision = guard().resolve(&Actor::scoped(t1, [Role::VIEWER]), Operation::ReadLedger);

        assert_eq!(decision.tenant_filter(None), Ok(Some(t1)));
        assert_eq!(decision.tenant_filter(Some(t1)), Ok(Some(t1)));
        assert!(decision.tenant_filter(Some(t2)).is_err());
    }

    #[test]
    fn delete_is_reserved_for_privileged_roles() {
        let actor = Actor::scoped(TenantId::new(), [Role::MANAGER]);
        let decision = guard().resolve(&actor, Operation::DeleteTransaction);
        assert_eq!(
            decision,
            AccessDecision::Denied(AuthzError::Forbidden("inventory.transactions.delete".to_string()))
        );
    }

    #[test]
    fn missing_permission_is_denied() {
        let actor = Actor::scoped(TenantId::new(), [Role::SALES]);
        assert!(matches!(
            guard().resolve(&actor, Operation::ReceivePurchaseOrder),
            AccessDecision::Denied(AuthzError::Forbidden(_))
        ));
    }

    #[test]
    fn configured_privileged_roles_replace_defaults() {
        let policy = RolePolicy::standard().with_privileged_roles([Role::new("root")]);
        let guard = TenantAccessGuard::new(policy);

        assert_eq!(
            guard.resolve(&Actor::unscoped([Role::new("root")]), Operation::DeleteTransaction),
            AccessDecision::Unrestricted
        );
        assert!(matches!(
            guard.resolve(&Actor::unscoped([Role::ADMIN]), Operation::ReadLedger),
            AccessDecision::Denied(AuthzError::NoTenant)
        ));
    }

    #[test]
    fn denied_converts_to_authorization_kind() {
        let err: DomainError = AuthzError::NoTenant.into();
        assert_eq!(err.kind(), stockledger_core::ErrorKind::Authorization);
    }

    proptest! {
        /// Property: a scoped decision admits exactly its own tenant.
        #[test]
        fn scoped_decision_admits_only_own_tenant(a in any::<u128>(), b in any::<u128>()) {
            prop_assume!(a != 0 && b != 0);
            let own = TenantId::from_uuid(Uuid::from_u128(a));
            let other = TenantId::from_uuid(Uuid::from_u128(b));
            let decision = guard().resolve(&Actor::scoped(own, [Role::MANAGER]), Operation::ReadLedger);

            prop_assert!(decision.admits(own));
            prop_assert_eq!(decision.admits(other), own == other);
        }
    }
}
