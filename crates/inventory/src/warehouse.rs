use serde::{Deserialize, Serialize};

use stockledger_core::{DomainError, DomainResult, Entity, TenantId, TenantOwned, record_id};

record_id!(
    /// Warehouse identifier (tenant-scoped via the warehouse's `tenant_id`).
    WarehouseId
);

/// A stock location belonging to one tenant.
///
/// `is_default` is advisory: nothing enforces a single default per tenant, so
/// selection code must cope with zero or several.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    id: WarehouseId,
    tenant_id: TenantId,
    name: String,
    is_default: bool,
}

impl Warehouse {
    pub fn new(tenant_id: TenantId, name: impl Into<String>) -> Self {
        Self {
            id: WarehouseId::new(),
            tenant_id,
            name: name.into(),
            is_default: false,
        }
    }

    pub fn with_id(mut self, id: WarehouseId) -> Self {
        self.id = id;
        self
    }

    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.tenant_id.is_nil() {
            return Err(DomainError::validation("warehouse tenant is required"));
        }
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("warehouse name cannot be empty"));
        }
        Ok(())
    }
}

impl Entity for Warehouse {
    type Id = WarehouseId;

    fn id(&self) -> WarehouseId {
        self.id
    }
}

impl TenantOwned for Warehouse {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}
