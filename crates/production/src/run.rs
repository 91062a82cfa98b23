use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockledger_core::{DomainError, DomainResult, Entity, TenantId, TenantOwned, record_id};
use stockledger_inventory::ProductId;
use stockledger_sales::{OrderId, OrderItemId};

record_id!(
    /// Production run identifier (tenant-scoped via the run's `tenant_id`).
    ProductionRunId
);

/// Production run lifecycle: `planned → in_progress → quality_check → completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductionRunStatus {
    Planned,
    InProgress,
    QualityCheck,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionStage {
    pub name: String,
    pub completed_at: Option<DateTime<Utc>>,
}

/// A production run producing one product, usually for one order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionRun {
    id: ProductionRunId,
    tenant_id: TenantId,
    product_id: ProductId,
    order_id: Option<OrderId>,
    order_item_id: Option<OrderItemId>,
    status: ProductionRunStatus,
    stages: Vec<ProductionStage>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl ProductionRun {
    pub fn planned(tenant_id: TenantId, product_id: ProductId) -> Self {
        Self {
            id: ProductionRunId::new(),
            tenant_id,
            product_id,
            order_id: None,
            order_item_id: None,
            status: ProductionRunStatus::Planned,
            stages: Vec::new(),
            started_at: None,
            completed_at: None,
        }
    }

    pub fn with_id(mut self, id: ProductionRunId) -> Self {
        self.id = id;
        self
    }

    pub fn for_order_item(mut self, order_id: OrderId, order_item_id: OrderItemId) -> Self {
        self.order_id = Some(order_id);
        self.order_item_id = Some(order_item_id);
        self
    }

    pub fn with_stages<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.stages = names
            .into_iter()
            .map(|name| ProductionStage {
                name: name.into(),
                completed_at: None,
            })
            .collect();
        self
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn order_id(&self) -> Option<OrderId> {
        self.order_id
    }

    pub fn order_item_id(&self) -> Option<OrderItemId> {
        self.order_item_id
    }

    pub fn status(&self) -> ProductionRunStatus {
        self.status
    }

    pub fn stages(&self) -> &[ProductionStage] {
        &self.stages
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Reference written on every ledger row produced by starting this run.
    pub fn ledger_reference(&self) -> String {
        format!("Production run #{}", self.id)
    }

    /// Idempotency gate for starting: only a planned run may consume materials.
    pub fn ensure_startable(&self) -> DomainResult<()> {
        if self.status != ProductionRunStatus::Planned {
            return Err(DomainError::conflict("already started"));
        }
        Ok(())
    }

    pub fn mark_started(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_startable()?;
        self.status = ProductionRunStatus::InProgress;
        self.started_at = Some(at);
        Ok(())
    }

    pub fn complete_stage(&mut self, name: &str, at: DateTime<Utc>) -> DomainResult<()> {
        if self.status != ProductionRunStatus::InProgress {
            return Err(DomainError::conflict("stages can only be completed while in progress"));
        }
        let stage = self
            .stages
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| DomainError::not_found(format!("stage '{name}'")))?;
        if stage.completed_at.is_some() {
            return Err(DomainError::conflict(format!("stage '{name}' already completed")));
        }
        stage.completed_at = Some(at);
        Ok(())
    }

    pub fn submit_for_quality_check(&mut self) -> DomainResult<()> {
        if self.status != ProductionRunStatus::InProgress {
            return Err(DomainError::conflict("only runs in progress can go to quality check"));
        }
        if let Some(open) = self.stages.iter().find(|s| s.completed_at.is_none()) {
            return Err(DomainError::conflict(format!("stage '{}' is not completed", open.name)));
        }
        self.status = ProductionRunStatus::QualityCheck;
        Ok(())
    }

    pub fn complete(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        if self.status != ProductionRunStatus::QualityCheck {
            return Err(DomainError::conflict("only runs in quality check can be completed"));
        }
        self.status = ProductionRunStatus::Completed;
        self.completed_at = Some(at);
        Ok(())
    }
}

impl Entity for ProductionRun {
    type Id = ProductionRunId;

    fn id(&self) -> ProductionRunId {
        self.id
    }
}

impl TenantOwned for ProductionRun {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run() -> ProductionRun {
        ProductionRun::planned(TenantId::new(), ProductId::new()).with_stages(["cutting", "assembly"])
    }

    #[test]
    fn start_is_allowed_once() {
        let mut run = run();
        run.mark_started(Utc::now()).unwrap();
        assert_eq!(run.status(), ProductionRunStatus::InProgress);

        match run.ensure_startable() {
            Err(DomainError::StateConflict(msg)) if msg == "already started" => {}
            other => panic!("expected already started conflict, got {other:?}"),
        }
    }

    #[test]
    fn quality_check_requires_all_stages() {
        let mut run = run();
        run.mark_started(Utc::now()).unwrap();
        run.complete_stage("cutting", Utc::now()).unwrap();
        assert!(run.submit_for_quality_check().is_err());

        run.complete_stage("assembly", Utc::now()).unwrap();
        run.submit_for_quality_check().unwrap();
        run.complete(Utc::now()).unwrap();
        assert_eq!(run.status(), ProductionRunStatus::Completed);
        assert!(run.completed_at().is_some());
    }

    #[test]
    fn unknown_stage_is_not_found() {
        let mut run = run();
        run.mark_started(Utc::now()).unwrap();
        assert!(matches!(run.complete_stage("painting", Utc::now()), Err(DomainError::NotFound(_))));
    }

    #[test]
    fn stages_cannot_complete_before_start() {
        let mut run = run();
        assert!(matches!(run.complete_stage("cutting", Utc::now()), Err(DomainError::StateConflict(_))));
    }

    #[test]
    fn cannot_skip_quality_check() {
        let mut run = run();
        run.mark_started(Utc::now()).unwrap();
        assert!(run.complete(Utc::now()).is_err());
    }
}
