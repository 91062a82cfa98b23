use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::hash::Hash;
use std::sync::RwLock;

use stockledger_core::TenantId;

use super::{Filter, StoreError, TenantRepository};

#[derive(Debug)]
struct Table<K, V> {
    next_seq: u64,
    rows: HashMap<(TenantId, K), (u64, V)>,
}

/// In-memory tenant-isolated repository.
///
/// Intended for tests/dev. `find` returns rows in insertion order; `update`
/// keeps a row's original position.
#[derive(Debug)]
pub struct InMemoryRepository<K, V> {
    inner: RwLock<Table<K, V>>,
}

impl<K, V> InMemoryRepository<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Table {
                next_seq: 0,
                rows: HashMap::new(),
            }),
        }
    }
}

impl<K, V> Default for InMemoryRepository<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Storage("lock poisoned".to_string())
}

#[async_trait::async_trait]
impl<K, V> TenantRepository<K, V> for InMemoryRepository<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, tenant_id: TenantId, key: &K) -> Result<Option<V>, StoreError> {
        let table = self.inner.read().map_err(poisoned)?;
        Ok(table.rows.get(&(tenant_id, key.clone())).map(|(_, v)| v.clone()))
    }

    async fn insert(&self, tenant_id: TenantId, key: K, value: V) -> Result<(), StoreError> {
        if tenant_id.is_nil() {
            return Err(StoreError::TenantIsolation("nil tenant id".to_string()));
        }

        let mut guard = self.inner.write().map_err(poisoned)?;
        let table = &mut *guard;
        let seq = table.next_seq;
        match table.rows.entry((tenant_id, key)) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists),
            Entry::Vacant(slot) => {
                slot.insert((seq, value));
                table.next_seq += 1;
                Ok(())
            }
        }
    }

    async fn update(&self, tenant_id: TenantId, key: K, value: V) -> Result<(), StoreError> {
        let mut table = self.inner.write().map_err(poisoned)?;
        match table.rows.get_mut(&(tenant_id, key)) {
            Some((_, existing)) => {
                *existing = value;
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete(&self, tenant_id: TenantId, key: &K) -> Result<Option<V>, StoreError> {
        let mut table = self.inner.write().map_err(poisoned)?;
        Ok(table.rows.remove(&(tenant_id, key.clone())).map(|(_, v)| v))
    }

    async fn find(&self, tenant_id: Option<TenantId>, filter: Filter<'_, V>) -> Result<Vec<V>, StoreError> {
        let table = self.inner.read().map_err(poisoned)?;

        let mut hits: Vec<(u64, V)> = table
            .rows
            .iter()
            .filter(|((t, _), _)| tenant_id.is_none_or(|wanted| *t == wanted))
            .filter(|(_, (_, v))| filter(v))
            .map(|(_, (seq, v))| (*seq, v.clone()))
            .collect();
        hits.sort_by_key(|(seq, _)| *seq);

        Ok(hits.into_iter().map(|(_, v)| v).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> InMemoryRepository<u32, &'static str> {
        InMemoryRepository::new()
    }

    #[tokio::test]
    async fn tenants_do_not_see_each_other() {
        let repo = repo();
        let (a, b) = (TenantId::new(), TenantId::new());
        repo.insert(a, 1, "a1").await.unwrap();
        repo.insert(b, 1, "b1").await.unwrap();

        assert_eq!(repo.get(a, &1).await.unwrap(), Some("a1"));
        assert_eq!(repo.find(Some(b), &|_| true).await.unwrap(), vec!["b1"]);
        assert_eq!(repo.find(None, &|_| true).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn find_keeps_insertion_order_across_updates() {
        let repo = repo();
        let t = TenantId::new();
        for (k, v) in [(3, "c"), (1, "a"), (2, "b")] {
            repo.insert(t, k, v).await.unwrap();
        }
        repo.update(t, 3, "C").await.unwrap();

        assert_eq!(repo.find(Some(t), &|_| true).await.unwrap(), vec!["C", "a", "b"]);
    }

    #[tokio::test]
    async fn duplicate_insert_and_missing_update_fail() {
        let repo = repo();
        let t = TenantId::new();
        repo.insert(t, 1, "x").await.unwrap();

        assert_eq!(repo.insert(t, 1, "y").await, Err(StoreError::AlreadyExists));
        assert_eq!(repo.update(t, 9, "y").await, Err(StoreError::NotFound));
        assert_eq!(repo.delete(t, &1).await.unwrap(), Some("x"));
        assert_eq!(repo.delete(t, &1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn nil_tenant_is_rejected() {
        let nil = TenantId::from_uuid(Default::default());
        assert!(matches!(repo().insert(nil, 1, "x").await, Err(StoreError::TenantIsolation(_))));
    }
}
