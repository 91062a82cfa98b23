use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockledger_core::{DomainError, DomainResult, Entity, TenantId, TenantOwned, record_id};

use crate::{ProductId, WarehouseId};

record_id!(
    /// Stock transaction identifier, assigned by the ledger on append.
    StockTransactionId
);

/// Largest absolute quantity a single ledger row may carry.
pub const MAX_ABS_QUANTITY: i64 = 1_000_000_000_000;

/// Why stock moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    PurchaseReceive,
    OrderDeduction,
    ManualAdjust,
    Return,
    Waste,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::PurchaseReceive => "purchase_receive",
            TransactionType::OrderDeduction => "order_deduction",
            TransactionType::ManualAdjust => "manual_adjust",
            TransactionType::Return => "return",
            TransactionType::Waste => "waste",
        }
    }
}

impl core::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable ledger row. Positive quantity adds stock, negative removes it.
///
/// There are no setters: a row is built once from a [`StockTransactionDraft`]
/// and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockTransaction {
    id: StockTransactionId,
    tenant_id: TenantId,
    product_id: ProductId,
    warehouse_id: WarehouseId,
    #[serde(rename = "type")]
    kind: TransactionType,
    quantity: i64,
    date: DateTime<Utc>,
    recorded_at: DateTime<Utc>,
    reference: Option<String>,
    supplier: Option<String>,
}

impl StockTransaction {
    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn warehouse_id(&self) -> WarehouseId {
        self.warehouse_id
    }

    pub fn kind(&self) -> TransactionType {
        self.kind
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    /// Business date of the movement.
    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    /// When the ledger persisted the row.
    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn supplier(&self) -> Option<&str> {
        self.supplier.as_deref()
    }
}

impl Entity for StockTransaction {
    type Id = StockTransactionId;

    fn id(&self) -> StockTransactionId {
        self.id
    }
}

impl TenantOwned for StockTransaction {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

/// Input for appending a ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockTransactionDraft {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub kind: TransactionType,
    pub quantity: i64,
    /// Business date; defaults to the append time.
    pub date: Option<DateTime<Utc>>,
    pub reference: Option<String>,
    pub supplier: Option<String>,
}

impl StockTransactionDraft {
    pub fn new(
        tenant_id: TenantId,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        kind: TransactionType,
        quantity: i64,
    ) -> Self {
        Self {
            tenant_id,
            product_id,
            warehouse_id,
            kind,
            quantity,
            date: None,
            reference: None,
            supplier: None,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_supplier(mut self, supplier: impl Into<String>) -> Self {
        self.supplier = Some(supplier.into());
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    /// Check required references and the quantity range.
    ///
    /// A zero quantity is accepted; it contributes nothing to the projection.
    pub fn validate(&self) -> DomainResult<()> {
        if self.tenant_id.is_nil() {
            return Err(DomainError::validation("tenant is required"));
        }
        if self.product_id.is_nil() {
            return Err(DomainError::validation("product is required"));
        }
        if self.warehouse_id.is_nil() {
            return Err(DomainError::validation("warehouse is required"));
        }
        if self.quantity.unsigned_abs() > MAX_ABS_QUANTITY as u64 {
            return Err(DomainError::validation(format!(
                "quantity {} exceeds the per-row limit of {MAX_ABS_QUANTITY}",
                self.quantity
            )));
        }
        Ok(())
    }

    /// Freeze the draft into a ledger row.
    pub fn into_transaction(self, id: StockTransactionId, recorded_at: DateTime<Utc>) -> StockTransaction {
        StockTransaction {
            id,
            tenant_id: self.tenant_id,
            product_id: self.product_id,
            warehouse_id: self.warehouse_id,
            kind: self.kind,
            quantity: self.quantity,
            date: self.date.unwrap_or(recorded_at),
            recorded_at,
            reference: non_blank(self.reference),
            supplier: non_blank(self.supplier),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockledger_core::AggregateId;

    fn nil_product() -> ProductId {
        // Uuid::default() is the nil UUID.
        ProductId(AggregateId::from_uuid(Default::default()))
    }

    fn draft(quantity: i64) -> StockTransactionDraft {
        StockTransactionDraft::new(
            TenantId::new(),
            ProductId::new(),
            WarehouseId::new(),
            TransactionType::ManualAdjust,
            quantity,
        )
    }

    #[test]
    fn missing_product_is_a_validation_error() {
        let mut d = draft(5);
        d.product_id = nil_product();
        let err = d.validate().unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("product")));
    }

    #[test]
    fn zero_quantity_is_accepted() {
        assert!(draft(0).validate().is_ok());
    }

    #[test]
    fn out_of_range_quantity_is_rejected() {
        assert!(draft(MAX_ABS_QUANTITY + 1).validate().is_err());
        assert!(draft(-MAX_ABS_QUANTITY).validate().is_ok());
    }

    #[test]
    fn date_defaults_to_recorded_time_and_blank_reference_is_dropped() {
        let now = Utc::now();
        let tx = draft(3)
            .with_reference("   ")
            .with_supplier(" Acme ")
            .into_transaction(StockTransactionId::new(), now);

        assert_eq!(tx.date(), now);
        assert_eq!(tx.reference(), None);
        assert_eq!(tx.supplier(), Some("Acme"));
    }

    #[test]
    fn type_field_uses_wire_names() {
        let tx = draft(-2)
            .with_reference("PO #1")
            .into_transaction(StockTransactionId::new(), Utc::now());
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["type"], "manual_adjust");
        assert_eq!(json["quantity"], -2);
    }
}
