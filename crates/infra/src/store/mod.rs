//! Tenant-partitioned record storage.
//!
//! The ledger and the workflows only need keyed create/read/update/delete plus a
//! predicate scan. Every call names a tenant; `find(None, ..)` is reserved for
//! callers that have already resolved an unrestricted access decision.

pub mod in_memory;

use core::fmt::Display;

use thiserror::Error;

use stockledger_core::{DomainError, DomainResult, Entity, TenantId, TenantOwned};

pub use in_memory::InMemoryRepository;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("record already exists")]
    AlreadyExists,

    #[error("tenant isolation violation: {0}")]
    TenantIsolation(String),

    #[error("storage failure: {0}")]
    Storage(String),
}

/// Storage details stop here: callers only see a stable kind and a generic message.
impl From<StoreError> for DomainError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound => DomainError::not_found("record"),
            StoreError::AlreadyExists => DomainError::conflict("record already exists"),
            StoreError::TenantIsolation(msg) => DomainError::consistency(msg),
            StoreError::Storage(detail) => {
                tracing::error!(error = %detail, "store operation failed");
                DomainError::storage("storage unavailable")
            }
        }
    }
}

/// Predicate used by [`TenantRepository::find`].
pub type Filter<'a, V> = &'a (dyn Fn(&V) -> bool + Send + Sync);

/// Async tenant-isolated repository.
#[async_trait::async_trait]
pub trait TenantRepository<K, V>: Send + Sync {
    async fn get(&self, tenant_id: TenantId, key: &K) -> Result<Option<V>, StoreError>;

    /// Fails with [`StoreError::AlreadyExists`] if the key is taken.
    async fn insert(&self, tenant_id: TenantId, key: K, value: V) -> Result<(), StoreError>;

    /// Replace an existing record. Fails with [`StoreError::NotFound`] if absent.
    async fn update(&self, tenant_id: TenantId, key: K, value: V) -> Result<(), StoreError>;

    /// Remove a record, returning it if it existed.
    async fn delete(&self, tenant_id: TenantId, key: &K) -> Result<Option<V>, StoreError>;

    /// Records matching `filter`, in insertion order. `None` scans every tenant.
    async fn find(&self, tenant_id: Option<TenantId>, filter: Filter<'_, V>) -> Result<Vec<V>, StoreError>;
}

/// Load `key` from `tenant_id`, telling a missing record apart from one that
/// lives under another tenant.
pub(crate) async fn load_owned<K, V>(
    repo: &dyn TenantRepository<K, V>,
    tenant_id: TenantId,
    key: K,
    what: &str,
) -> DomainResult<V>
where
    K: Copy + PartialEq + Display + Send + Sync + 'static,
    V: Entity<Id = K> + TenantOwned + Send + 'static,
{
    if let Some(found) = repo.get(tenant_id, &key).await? {
        if !found.belongs_to(tenant_id) {
            tracing::error!(tenant_id = %tenant_id, %key, what, "record stored under a foreign tenant");
            return Err(DomainError::consistency(format!("{what} {key} is stored under the wrong tenant")));
        }
        return Ok(found);
    }

    let same_id = move |v: &V| v.id() == key;
    if repo.find(None, &same_id).await?.is_empty() {
        return Err(DomainError::not_found(format!("{what} {key}")));
    }

    tracing::warn!(tenant_id = %tenant_id, %key, what, "cross-tenant reference rejected");
    Err(DomainError::consistency(format!("{what} {key} belongs to another tenant")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockledger_core::ErrorKind;
    use stockledger_inventory::{Warehouse, WarehouseId};

    #[tokio::test]
    async fn load_owned_separates_missing_foreign_and_misfiled_records() {
        let store: InMemoryRepository<WarehouseId, Warehouse> = InMemoryRepository::new();
        let repo: &dyn TenantRepository<WarehouseId, Warehouse> = &store;
        let (own, other) = (TenantId::new(), TenantId::new());

        let home = Warehouse::new(own, "Main");
        let away = Warehouse::new(other, "Annex");
        let misfiled = Warehouse::new(other, "Overflow");
        repo.insert(own, home.id(), home.clone()).await.unwrap();
        repo.insert(other, away.id(), away.clone()).await.unwrap();
        repo.insert(own, misfiled.id(), misfiled.clone()).await.unwrap();

        assert_eq!(load_owned(repo, own, home.id(), "warehouse").await.unwrap(), home);

        let kind_of = |result: DomainResult<Warehouse>| result.unwrap_err().kind();
        assert_eq!(kind_of(load_owned(repo, own, WarehouseId::new(), "warehouse").await), ErrorKind::NotFound);
        assert_eq!(kind_of(load_owned(repo, own, away.id(), "warehouse").await), ErrorKind::Consistency);
        assert_eq!(kind_of(load_owned(repo, own, misfiled.id(), "warehouse").await), ErrorKind::Consistency);
    }
}
