//! Stock ledger: append-only transactions and the per-product projection.
//!
//! Every mutation follows the same cycle under the `(tenant, product)` key:
//!
//! ```text
//! lock(tenant, product)
//!   ↓
//! write ledger row (insert or delete)
//!   ↓
//! fold the change into the cached projection, or rescan the ledger
//!   ↓
//! overwrite product.stock in one write (undo the ledger row if this fails)
//! ```
//!
//! Writers on different keys never coordinate.

use std::sync::Arc;

use chrono::Utc;

use stockledger_auth::{Actor, Operation, TenantAccessGuard};
use stockledger_core::{DomainError, DomainResult, Entity, TenantId, TenantOwned};
use stockledger_inventory::{
    AggregationMode, LedgerChange, Product, ProductId, StockProjection, StockTransaction, StockTransactionDraft,
    StockTransactionId, TransactionType, Warehouse, WarehouseCandidate, WarehouseId, WarehouseSelector,
};

use crate::locks::{KeyGuard, KeyedLocks};
use crate::store::{TenantRepository, load_owned};

pub type TransactionRepository = Arc<dyn TenantRepository<StockTransactionId, StockTransaction>>;
pub type ProductRepository = Arc<dyn TenantRepository<ProductId, Product>>;
pub type WarehouseRepository = Arc<dyn TenantRepository<WarehouseId, Warehouse>>;

/// Filter for [`StockLedger::list_transactions`]. Unset fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionQuery {
    pub tenant_id: Option<TenantId>,
    pub product_id: Option<ProductId>,
    pub warehouse_id: Option<WarehouseId>,
    pub kind: Option<TransactionType>,
}

impl TransactionQuery {
    pub fn for_product(tenant_id: TenantId, product_id: ProductId) -> Self {
        Self {
            tenant_id: Some(tenant_id),
            product_id: Some(product_id),
            ..Self::default()
        }
    }

    fn matches(&self, tx: &StockTransaction) -> bool {
        self.product_id.is_none_or(|p| tx.product_id() == p)
            && self.warehouse_id.is_none_or(|w| tx.warehouse_id() == w)
            && self.kind.is_none_or(|k| tx.kind() == k)
    }
}

pub struct StockLedger {
    transactions: TransactionRepository,
    products: ProductRepository,
    warehouses: WarehouseRepository,
    guard: TenantAccessGuard,
    aggregation: AggregationMode,
    locks: KeyedLocks<(TenantId, ProductId)>,
}

impl StockLedger {
    pub fn new(
        transactions: TransactionRepository,
        products: ProductRepository,
        warehouses: WarehouseRepository,
        guard: TenantAccessGuard,
        aggregation: AggregationMode,
    ) -> Self {
        Self {
            transactions,
            products,
            warehouses,
            guard,
            aggregation,
            locks: KeyedLocks::new(),
        }
    }

    /// Record a stock movement and refresh the product's projection.
    pub async fn append_transaction(
        &self,
        actor: &Actor,
        draft: StockTransactionDraft,
    ) -> DomainResult<StockTransaction> {
        self.guard
            .resolve(actor, Operation::AppendTransaction)
            .authorize_tenant(draft.tenant_id)?;
        self.append_authorized(draft).await
    }

    /// Remove a ledger row (admin only) and refresh the product's projection.
    pub async fn delete_transaction(
        &self,
        actor: &Actor,
        tenant_id: TenantId,
        transaction_id: StockTransactionId,
    ) -> DomainResult<StockTransaction> {
        self.guard
            .resolve(actor, Operation::DeleteTransaction)
            .authorize_tenant(tenant_id)?;

        let tx = self
            .transactions
            .get(tenant_id, &transaction_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("stock transaction {transaction_id}")))?;
        self.retract(&tx).await?;

        tracing::info!(
            tenant_id = %tenant_id,
            product_id = %tx.product_id(),
            transaction_id = %transaction_id,
            "stock transaction deleted"
        );
        Ok(tx)
    }

    /// Re-derive the projection for `(tenant, product)` from the full ledger.
    ///
    /// Unguarded: callers outside the crate go through [`StockLedger::reconcile`].
    pub(crate) async fn recompute(&self, tenant_id: TenantId, product_id: ProductId) -> DomainResult<StockProjection> {
        let _key = self.locks.lock((tenant_id, product_id)).await;
        self.refresh_locked(tenant_id, product_id, None).await
    }

    /// Forced full rescan, regardless of the aggregation mode.
    pub async fn reconcile(
        &self,
        actor: &Actor,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> DomainResult<StockProjection> {
        self.guard
            .resolve(actor, Operation::ReconcileStock)
            .authorize_tenant(tenant_id)?;

        let projection = self.recompute(tenant_id, product_id).await?;
        tracing::info!(
            tenant_id = %tenant_id,
            product_id = %product_id,
            stock = projection.total(),
            "stock reconciled"
        );
        Ok(projection)
    }

    /// Ledger rows visible to `actor`, in append order.
    ///
    /// A scoped actor that leaves `query.tenant_id` unset sees its own tenant only;
    /// naming another tenant is an authorization error.
    pub async fn list_transactions(
        &self,
        actor: &Actor,
        query: TransactionQuery,
    ) -> DomainResult<Vec<StockTransaction>> {
        let scope = self
            .guard
            .resolve(actor, Operation::ReadLedger)
            .tenant_filter(query.tenant_id)?;

        let filter = move |tx: &StockTransaction| query.matches(tx);
        Ok(self.transactions.find(scope, &filter).await?)
    }

    pub async fn stock_of(
        &self,
        actor: &Actor,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> DomainResult<StockProjection> {
        self.guard
            .resolve(actor, Operation::ReadLedger)
            .authorize_tenant(tenant_id)?;
        Ok(self.product(tenant_id, product_id).await?.stock().clone())
    }

    /// Append without an access check. Callers must have authorized the tenant.
    pub(crate) async fn append_authorized(&self, draft: StockTransactionDraft) -> DomainResult<StockTransaction> {
        draft.validate()?;
        let (tenant_id, product_id) = (draft.tenant_id, draft.product_id);
        self.product(tenant_id, product_id).await?;
        load_owned(&*self.warehouses, tenant_id, draft.warehouse_id, "warehouse").await?;

        let _key = self.locks.lock((tenant_id, product_id)).await;
        let tx = draft.into_transaction(StockTransactionId::new(), Utc::now());
        self.transactions.insert(tenant_id, tx.id(), tx.clone()).await?;

        let change = LedgerChange::appended(&tx);
        if let Err(err) = self.refresh_locked(tenant_id, product_id, Some(&change)).await {
            if let Err(undo) = self.transactions.delete(tenant_id, &tx.id()).await {
                tracing::error!(
                    tenant_id = %tenant_id,
                    transaction_id = %tx.id(),
                    error = %undo,
                    "failed to undo ledger row after projection failure"
                );
            }
            return Err(err);
        }

        tracing::info!(
            tenant_id = %tenant_id,
            product_id = %product_id,
            transaction_id = %tx.id(),
            kind = %tx.kind(),
            quantity = tx.quantity(),
            "stock transaction appended"
        );
        Ok(tx)
    }

    /// Retract rows a failed workflow emitted, newest first.
    pub(crate) async fn compensate(&self, emitted: &[StockTransaction]) {
        for tx in emitted.iter().rev() {
            match self.retract(tx).await {
                Ok(()) => tracing::warn!(
                    tenant_id = %tx.tenant_id(),
                    product_id = %tx.product_id(),
                    transaction_id = %tx.id(),
                    "stock transaction compensated"
                ),
                Err(err) => tracing::error!(
                    tenant_id = %tx.tenant_id(),
                    product_id = %tx.product_id(),
                    transaction_id = %tx.id(),
                    error = %err,
                    "compensation failed; reconcile this product"
                ),
            }
        }
    }

    pub(crate) async fn product(&self, tenant_id: TenantId, product_id: ProductId) -> DomainResult<Product> {
        load_owned(&*self.products, tenant_id, product_id, "product").await
    }

    /// Serialize a product write against projection refreshes.
    pub(crate) async fn lock_product(&self, tenant_id: TenantId, product_id: ProductId) -> KeyGuard {
        self.locks.lock((tenant_id, product_id)).await
    }

    /// Pick a warehouse of `tenant_id`. `material` supplies per-warehouse holdings.
    pub(crate) async fn select_warehouse(
        &self,
        tenant_id: TenantId,
        material: Option<&Product>,
        selector: &dyn WarehouseSelector,
    ) -> DomainResult<WarehouseId> {
        let warehouses = self.warehouses.find(Some(tenant_id), &|_| true).await?;
        let candidates: Vec<WarehouseCandidate> = warehouses
            .iter()
            .map(|w| WarehouseCandidate {
                warehouse_id: w.id(),
                is_default: w.is_default(),
                on_hand: material.map_or(0, |m| m.stock().quantity_in(w.id())),
            })
            .collect();

        selector
            .select(&candidates)
            .ok_or_else(|| DomainError::consistency("no warehouse available"))
    }

    async fn retract(&self, tx: &StockTransaction) -> DomainResult<()> {
        let (tenant_id, product_id) = (tx.tenant_id(), tx.product_id());
        let _key = self.locks.lock((tenant_id, product_id)).await;

        let Some(removed) = self.transactions.delete(tenant_id, &tx.id()).await? else {
            return Err(DomainError::not_found(format!("stock transaction {}", tx.id())));
        };

        let change = LedgerChange::removed(&removed);
        if let Err(err) = self.refresh_locked(tenant_id, product_id, Some(&change)).await {
            let id = removed.id();
            if let Err(undo) = self.transactions.insert(tenant_id, id, removed).await {
                tracing::error!(
                    tenant_id = %tenant_id,
                    transaction_id = %id,
                    error = %undo,
                    "failed to restore ledger row after projection failure"
                );
            }
            return Err(err);
        }
        Ok(())
    }

    /// Caller holds the `(tenant, product)` lock.
    async fn refresh_locked(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        change: Option<&LedgerChange>,
    ) -> DomainResult<StockProjection> {
        let mut product = self.product(tenant_id, product_id).await?;

        let next = match self.aggregation.fold(product.stock(), change) {
            Some(folded) => folded,
            None => self.rescan(tenant_id, product_id).await?,
        };

        product.replace_stock(next.clone());
        self.products.update(tenant_id, product_id, product).await?;

        tracing::debug!(
            tenant_id = %tenant_id,
            product_id = %product_id,
            stock = next.total(),
            warehouses = next.warehouse_stock().len(),
            "projection refreshed"
        );
        Ok(next)
    }

    async fn rescan(&self, tenant_id: TenantId, product_id: ProductId) -> DomainResult<StockProjection> {
        let same_product = move |tx: &StockTransaction| tx.product_id() == product_id;
        let rows = self.transactions.find(Some(tenant_id), &same_product).await?;
        Ok(StockProjection::from_transactions(&rows))
    }
}
