use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockledger_core::{DomainError, DomainResult, Entity, TenantId, TenantOwned, record_id};
use stockledger_inventory::ProductId;

record_id!(
    /// Purchase order identifier (tenant-scoped via the order's `tenant_id`).
    PurchaseOrderId
);

/// Purchase order status lifecycle.
///
/// `draft → ordered → received`, with `cancelled` reachable before receipt.
/// `received` is terminal and one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseOrderStatus {
    Draft,
    Ordered,
    Received,
    Cancelled,
}

/// Purchase order line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderItem {
    pub product_id: ProductId,
    pub quantity: i64,
    /// Cost per unit in smallest currency unit (e.g., cents).
    pub unit_cost: i64,
}

/// Purchase order record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    id: PurchaseOrderId,
    tenant_id: TenantId,
    supplier: String,
    status: PurchaseOrderStatus,
    items: Vec<PurchaseOrderItem>,
    received_at: Option<DateTime<Utc>>,
}

impl PurchaseOrder {
    /// A new draft order with no items.
    pub fn draft(tenant_id: TenantId, supplier: impl Into<String>) -> Self {
        Self {
            id: PurchaseOrderId::new(),
            tenant_id,
            supplier: supplier.into(),
            status: PurchaseOrderStatus::Draft,
            items: Vec::new(),
            received_at: None,
        }
    }

    pub fn with_id(mut self, id: PurchaseOrderId) -> Self {
        self.id = id;
        self
    }

    pub fn supplier(&self) -> &str {
        &self.supplier
    }

    pub fn status(&self) -> PurchaseOrderStatus {
        self.status
    }

    pub fn items(&self) -> &[PurchaseOrderItem] {
        &self.items
    }

    pub fn received_at(&self) -> Option<DateTime<Utc>> {
        self.received_at
    }

    /// Total order cost in smallest currency unit.
    pub fn total_cost(&self) -> DomainResult<i64> {
        self.items.iter().try_fold(0i64, |total, item| {
            item.quantity
                .checked_mul(item.unit_cost)
                .and_then(|line| total.checked_add(line))
                .ok_or_else(|| DomainError::validation("purchase order cost overflows"))
        })
    }

    /// Reference written on every ledger row produced by receiving this order.
    pub fn ledger_reference(&self) -> String {
        format!("PO #{}", self.id)
    }

    /// Add a line item (only allowed in Draft).
    pub fn add_item(&mut self, item: PurchaseOrderItem) -> DomainResult<()> {
        if self.status != PurchaseOrderStatus::Draft {
            return Err(DomainError::conflict(
                "cannot modify purchase order once ordered, received or cancelled",
            ));
        }
        validate_item(&item)?;
        self.items.push(item);
        Ok(())
    }

    /// Whole-record checks for orders that did not go through [`PurchaseOrder::add_item`],
    /// e.g. ones decoded from a request body.
    pub fn validate(&self) -> DomainResult<()> {
        if self.tenant_id.is_nil() {
            return Err(DomainError::validation("tenant is required"));
        }
        if self.supplier.trim().is_empty() {
            return Err(DomainError::validation("supplier is required"));
        }
        self.items.iter().try_for_each(validate_item)?;
        self.total_cost()?;
        Ok(())
    }

    /// Send the order to the supplier.
    pub fn place(&mut self) -> DomainResult<()> {
        if self.status != PurchaseOrderStatus::Draft {
            return Err(DomainError::conflict("only draft purchase orders can be placed"));
        }
        if self.items.is_empty() {
            return Err(DomainError::validation("cannot place purchase order without items"));
        }
        self.status = PurchaseOrderStatus::Ordered;
        Ok(())
    }

    pub fn cancel(&mut self) -> DomainResult<()> {
        match self.status {
            PurchaseOrderStatus::Draft | PurchaseOrderStatus::Ordered => {
                self.status = PurchaseOrderStatus::Cancelled;
                Ok(())
            }
            PurchaseOrderStatus::Received => Err(DomainError::conflict("already received")),
            PurchaseOrderStatus::Cancelled => Err(DomainError::conflict("already cancelled")),
        }
    }

    /// Idempotency gate for receiving: a received order is never received twice.
    pub fn ensure_receivable(&self) -> DomainResult<()> {
        match self.status {
            PurchaseOrderStatus::Received => Err(DomainError::conflict("already received")),
            PurchaseOrderStatus::Cancelled => {
                Err(DomainError::conflict("cannot receive a cancelled purchase order"))
            }
            PurchaseOrderStatus::Draft | PurchaseOrderStatus::Ordered => Ok(()),
        }
    }

    /// Close the order as received. Called once every item has been credited.
    pub fn mark_received(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_receivable()?;
        self.status = PurchaseOrderStatus::Received;
        self.received_at = Some(at);
        Ok(())
    }
}

fn validate_item(item: &PurchaseOrderItem) -> DomainResult<()> {
    if item.product_id.is_nil() {
        return Err(DomainError::validation("product is required"));
    }
    if item.quantity <= 0 {
        return Err(DomainError::validation("quantity must be positive"));
    }
    if item.unit_cost < 0 {
        return Err(DomainError::validation("unit cost cannot be negative"));
    }
    Ok(())
}

impl Entity for PurchaseOrder {
    type Id = PurchaseOrderId;

    fn id(&self) -> PurchaseOrderId {
        self.id
    }
}

impl TenantOwned for PurchaseOrder {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}
