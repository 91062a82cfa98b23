//! Production run orchestration.
//!
//! Starting a run debits the BOM materials from the ledger and moves the run to
//! `in_progress`. The sequence runs under a per-run lock; on failure the debits
//! emitted so far are retracted and the run stays `planned`.

use std::sync::Arc;

use chrono::Utc;

use stockledger_auth::{Actor, Operation, TenantAccessGuard};
use stockledger_core::{DomainError, DomainResult, Entity, TenantId, TenantOwned};
use stockledger_inventory::{StockTransaction, StockTransactionDraft, TransactionType, WarehouseId, WarehouseSelector};
use stockledger_production::{
    MaterialRequirement, ProductionRun, ProductionRunId, ProductionRunStatus, plan_material_consumption,
    resolve_quantity_to_make,
};
use stockledger_sales::{Order, OrderId};

use crate::ledger::StockLedger;
use crate::locks::KeyedLocks;
use crate::orders::OrderRepository;
use crate::store::{TenantRepository, load_owned};

pub type ProductionRunRepository = Arc<dyn TenantRepository<ProductionRunId, ProductionRun>>;

pub struct ProductionConsumptionPlanner {
    ledger: Arc<StockLedger>,
    runs: ProductionRunRepository,
    orders: OrderRepository,
    guard: TenantAccessGuard,
    selector: Arc<dyn WarehouseSelector>,
    locks: KeyedLocks<(TenantId, ProductionRunId)>,
}

impl ProductionConsumptionPlanner {
    pub fn new(
        ledger: Arc<StockLedger>,
        runs: ProductionRunRepository,
        orders: OrderRepository,
        guard: TenantAccessGuard,
        selector: Arc<dyn WarehouseSelector>,
    ) -> Self {
        Self {
            ledger,
            runs,
            orders,
            guard,
            selector,
            locks: KeyedLocks::new(),
        }
    }

    /// Register a new run. Only `planned` runs for a product of the same tenant are accepted.
    pub async fn plan_production_run(&self, actor: &Actor, run: ProductionRun) -> DomainResult<ProductionRun> {
        let tenant_id = run.tenant_id();
        self.guard
            .resolve(actor, Operation::WriteProductionRun)
            .authorize_tenant(tenant_id)?;

        if run.status() != ProductionRunStatus::Planned {
            return Err(DomainError::conflict("new production runs must be planned"));
        }
        self.ledger.product(tenant_id, run.product_id()).await?;
        if let Some(order_id) = run.order_id() {
            self.linked_order(tenant_id, order_id).await?;
        }

        self.runs.insert(tenant_id, run.id(), run.clone()).await?;
        tracing::info!(tenant_id = %tenant_id, run_id = %run.id(), product_id = %run.product_id(), "production run planned");
        Ok(run)
    }

    /// Debit the BOM for the linked order quantity and move the run to `in_progress`.
    pub async fn start_production_run(
        &self,
        actor: &Actor,
        tenant_id: TenantId,
        run_id: ProductionRunId,
    ) -> DomainResult<ProductionRun> {
        self.guard
            .resolve(actor, Operation::WriteProductionRun)
            .authorize_tenant(tenant_id)?;

        let _key = self.locks.lock((tenant_id, run_id)).await;
        let mut run = self.load(tenant_id, run_id).await?;
        run.ensure_startable()?;

        let product = self.ledger.product(tenant_id, run.product_id()).await?;
        let quantity_to_make = self.quantity_to_make(&run).await?;

        let requirements = if product.production_bom().is_empty() {
            tracing::warn!(
                tenant_id = %tenant_id,
                run_id = %run_id,
                product_id = %product.id(),
                "product has no BOM; skipping material consumption"
            );
            Vec::new()
        } else {
            plan_material_consumption(product.production_bom(), quantity_to_make)?
        };

        // Resolve every source before the first debit so lookups fail with nothing to undo.
        let mut sourced: Vec<(MaterialRequirement, WarehouseId)> = Vec::with_capacity(requirements.len());
        for requirement in requirements {
            let material = self.ledger.product(tenant_id, requirement.material).await?;
            let warehouse_id = self
                .ledger
                .select_warehouse(tenant_id, Some(&material), self.selector.as_ref())
                .await?;
            sourced.push((requirement, warehouse_id));
        }

        let reference = run.ledger_reference();
        let mut emitted: Vec<StockTransaction> = Vec::with_capacity(sourced.len());
        for (requirement, warehouse_id) in &sourced {
            let draft = StockTransactionDraft::new(
                tenant_id,
                requirement.material,
                *warehouse_id,
                TransactionType::OrderDeduction,
                requirement.ledger_quantity(),
            )
            .with_reference(reference.clone());

            match self.ledger.append_authorized(draft).await {
                Ok(tx) => emitted.push(tx),
                Err(err) => return Err(self.abort(tenant_id, run_id, &emitted, err).await),
            }
        }

        let started = match run.mark_started(Utc::now()) {
            Ok(()) => self
                .runs
                .update(tenant_id, run_id, run.clone())
                .await
                .map_err(DomainError::from),
            Err(err) => Err(err),
        };
        if let Err(err) = started {
            return Err(self.abort(tenant_id, run_id, &emitted, err).await);
        }

        tracing::info!(
            tenant_id = %tenant_id,
            run_id = %run_id,
            quantity_to_make,
            debits = emitted.len(),
            "production run started"
        );
        Ok(run)
    }

    pub async fn complete_stage(
        &self,
        actor: &Actor,
        tenant_id: TenantId,
        run_id: ProductionRunId,
        stage: &str,
    ) -> DomainResult<ProductionRun> {
        self.transition(actor, tenant_id, run_id, |run| run.complete_stage(stage, Utc::now()))
            .await
    }

    pub async fn submit_for_quality_check(
        &self,
        actor: &Actor,
        tenant_id: TenantId,
        run_id: ProductionRunId,
    ) -> DomainResult<ProductionRun> {
        self.transition(actor, tenant_id, run_id, ProductionRun::submit_for_quality_check)
            .await
    }

    pub async fn complete_production_run(
        &self,
        actor: &Actor,
        tenant_id: TenantId,
        run_id: ProductionRunId,
    ) -> DomainResult<ProductionRun> {
        self.transition(actor, tenant_id, run_id, |run| run.complete(Utc::now()))
            .await
    }

    async fn transition(
        &self,
        actor: &Actor,
        tenant_id: TenantId,
        run_id: ProductionRunId,
        step: impl FnOnce(&mut ProductionRun) -> DomainResult<()> + Send,
    ) -> DomainResult<ProductionRun> {
        self.guard
            .resolve(actor, Operation::WriteProductionRun)
            .authorize_tenant(tenant_id)?;

        let _key = self.locks.lock((tenant_id, run_id)).await;
        let mut run = self.load(tenant_id, run_id).await?;
        step(&mut run)?;
        self.runs.update(tenant_id, run_id, run.clone()).await?;

        tracing::info!(tenant_id = %tenant_id, run_id = %run_id, status = ?run.status(), "production run updated");
        Ok(run)
    }

    /// Quantity of the linked order item, or the default when it cannot be resolved.
    async fn quantity_to_make(&self, run: &ProductionRun) -> DomainResult<i64> {
        let item_quantity = match (run.order_id(), run.order_item_id()) {
            (Some(order_id), Some(item_id)) => self
                .linked_order(run.tenant_id(), order_id)
                .await?
                .as_ref()
                .and_then(|order: &Order| order.item(item_id))
                .map(|item| item.quantity),
            _ => None,
        };

        let quantity = resolve_quantity_to_make(item_quantity);
        if item_quantity != Some(quantity) {
            tracing::warn!(
                tenant_id = %run.tenant_id(),
                run_id = %run.id(),
                quantity,
                "order item unresolved; producing default quantity"
            );
        }
        Ok(quantity)
    }

    /// The order a run produces for. A missing order is tolerated (the run falls
    /// back to the default quantity); one owned by another tenant is not.
    async fn linked_order(&self, tenant_id: TenantId, order_id: OrderId) -> DomainResult<Option<Order>> {
        match load_owned(&*self.orders, tenant_id, order_id, "order").await {
            Ok(order) => Ok(Some(order)),
            Err(DomainError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn load(&self, tenant_id: TenantId, run_id: ProductionRunId) -> DomainResult<ProductionRun> {
        self.runs
            .get(tenant_id, &run_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("production run {run_id}")))
    }

    async fn abort(
        &self,
        tenant_id: TenantId,
        run_id: ProductionRunId,
        emitted: &[StockTransaction],
        err: DomainError,
    ) -> DomainError {
        tracing::warn!(
            tenant_id = %tenant_id,
            run_id = %run_id,
            emitted = emitted.len(),
            error = %err,
            "production run start failed; compensating"
        );
        self.ledger.compensate(emitted).await;
        err
    }
}
