//! Purchase order receiving.
//!
//! `check status → credit every line → close the order` runs under a per-order
//! lock. Any failure retracts the credits already emitted by that invocation, so
//! a retry starts from the pre-operation state and can never double-credit.

use std::sync::Arc;

use chrono::Utc;

use stockledger_auth::{Actor, Operation, TenantAccessGuard};
use stockledger_core::{DomainError, DomainResult, Entity, TenantId, TenantOwned};
use stockledger_inventory::{DefaultThenAny, StockTransaction, StockTransactionDraft, TransactionType};
use stockledger_purchasing::{PurchaseOrder, PurchaseOrderId, PurchaseOrderStatus};

use crate::ledger::StockLedger;
use crate::locks::KeyedLocks;
use crate::store::TenantRepository;

pub type PurchaseOrderRepository = Arc<dyn TenantRepository<PurchaseOrderId, PurchaseOrder>>;

pub struct PurchaseReceivingWorkflow {
    ledger: Arc<StockLedger>,
    purchase_orders: PurchaseOrderRepository,
    guard: TenantAccessGuard,
    locks: KeyedLocks<(TenantId, PurchaseOrderId)>,
}

impl PurchaseReceivingWorkflow {
    pub fn new(ledger: Arc<StockLedger>, purchase_orders: PurchaseOrderRepository, guard: TenantAccessGuard) -> Self {
        Self {
            ledger,
            purchase_orders,
            guard,
            locks: KeyedLocks::new(),
        }
    }

    /// Create or replace a purchase order that has not been received or cancelled.
    ///
    /// Lines need a positive quantity, a non-negative unit cost and a product of the
    /// order's tenant.
    pub async fn save_purchase_order(&self, actor: &Actor, po: PurchaseOrder) -> DomainResult<PurchaseOrder> {
        let tenant_id = po.tenant_id();
        self.guard
            .resolve(actor, Operation::WritePurchaseOrder)
            .authorize_tenant(tenant_id)?;

        if !matches!(po.status(), PurchaseOrderStatus::Draft | PurchaseOrderStatus::Ordered) {
            return Err(DomainError::conflict(
                "purchase orders are received and cancelled through the workflow",
            ));
        }
        po.validate()?;
        for item in po.items() {
            self.ledger.product(tenant_id, item.product_id).await?;
        }

        let _key = self.locks.lock((tenant_id, po.id())).await;
        match self.purchase_orders.get(tenant_id, &po.id()).await? {
            None => self.purchase_orders.insert(tenant_id, po.id(), po.clone()).await?,
            Some(stored) => {
                stored.ensure_receivable()?;
                self.purchase_orders.update(tenant_id, po.id(), po.clone()).await?;
            }
        }

        tracing::info!(tenant_id = %tenant_id, purchase_order_id = %po.id(), status = ?po.status(), "purchase order saved");
        Ok(po)
    }

    /// Credit every line into the tenant's default warehouse (or any warehouse)
    /// and close the order as received.
    pub async fn receive_purchase_order(
        &self,
        actor: &Actor,
        tenant_id: TenantId,
        po_id: PurchaseOrderId,
    ) -> DomainResult<PurchaseOrder> {
        self.guard
            .resolve(actor, Operation::ReceivePurchaseOrder)
            .authorize_tenant(tenant_id)?;

        let _key = self.locks.lock((tenant_id, po_id)).await;
        let mut po = self.load(tenant_id, po_id).await?;
        po.ensure_receivable()?;

        let warehouse_id = self.ledger.select_warehouse(tenant_id, None, &DefaultThenAny).await?;
        let reference = po.ledger_reference();

        let mut emitted: Vec<StockTransaction> = Vec::with_capacity(po.items().len());
        for item in po.items() {
            let draft = StockTransactionDraft::new(
                tenant_id,
                item.product_id,
                warehouse_id,
                TransactionType::PurchaseReceive,
                item.quantity,
            )
            .with_reference(reference.clone())
            .with_supplier(po.supplier());

            match self.ledger.append_authorized(draft).await {
                Ok(tx) => emitted.push(tx),
                Err(err) => return Err(self.abort(tenant_id, po_id, &emitted, err).await),
            }
        }

        let close = match po.mark_received(Utc::now()) {
            Ok(()) => self
                .purchase_orders
                .update(tenant_id, po_id, po.clone())
                .await
                .map_err(DomainError::from),
            Err(err) => Err(err),
        };
        if let Err(err) = close {
            return Err(self.abort(tenant_id, po_id, &emitted, err).await);
        }

        tracing::info!(
            tenant_id = %tenant_id,
            purchase_order_id = %po_id,
            warehouse_id = %warehouse_id,
            lines = emitted.len(),
            "purchase order received"
        );
        Ok(po)
    }

    pub async fn cancel_purchase_order(
        &self,
        actor: &Actor,
        tenant_id: TenantId,
        po_id: PurchaseOrderId,
    ) -> DomainResult<PurchaseOrder> {
        self.guard
            .resolve(actor, Operation::WritePurchaseOrder)
            .authorize_tenant(tenant_id)?;

        let _key = self.locks.lock((tenant_id, po_id)).await;
        let mut po = self.load(tenant_id, po_id).await?;
        po.cancel()?;
        self.purchase_orders.update(tenant_id, po_id, po.clone()).await?;

        tracing::info!(tenant_id = %tenant_id, purchase_order_id = %po_id, "purchase order cancelled");
        Ok(po)
    }

    async fn load(&self, tenant_id: TenantId, po_id: PurchaseOrderId) -> DomainResult<PurchaseOrder> {
        self.purchase_orders
            .get(tenant_id, &po_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("purchase order {po_id}")))
    }

    async fn abort(
        &self,
        tenant_id: TenantId,
        po_id: PurchaseOrderId,
        emitted: &[StockTransaction],
        err: DomainError,
    ) -> DomainError {
        tracing::warn!(
            tenant_id = %tenant_id,
            purchase_order_id = %po_id,
            emitted = emitted.len(),
            error = %err,
            "purchase order receiving failed; compensating"
        );
        self.ledger.compensate(emitted).await;
        err
    }
}
