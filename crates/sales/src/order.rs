use serde::{Deserialize, Serialize};

use stockledger_core::{Entity, TenantId, TenantOwned, record_id};
use stockledger_inventory::ProductId;

record_id!(
    /// Customer order identifier (tenant-scoped via the order's `tenant_id`).
    OrderId
);

record_id!(
    /// Identifier of one line on a customer order.
    OrderItemId
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    InProgress,
    Delivered,
}

/// Order line: product, quantity, unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub quantity: i64,
    /// Price in smallest currency unit (e.g., cents).
    pub unit_price: i64,
}

/// Customer order.
///
/// Amounts are in smallest currency unit. Fields are plain data: the API layer
/// edits them freely and [`crate::PaymentInvariantChecker`] gates every write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub tenant_id: TenantId,
    pub customer: String,
    pub items: Vec<OrderItem>,
    pub total_amount: i64,
    pub advance_paid: i64,
    pub remaining_paid: i64,
    pub status: OrderStatus,
}

impl Order {
    pub fn new(tenant_id: TenantId, customer: impl Into<String>, total_amount: i64) -> Self {
        Self {
            id: OrderId::new(),
            tenant_id,
            customer: customer.into(),
            items: Vec::new(),
            total_amount,
            advance_paid: 0,
            remaining_paid: 0,
            status: OrderStatus::Pending,
        }
    }

    pub fn with_item(mut self, product_id: ProductId, quantity: i64, unit_price: i64) -> Self {
        self.items.push(OrderItem {
            id: OrderItemId::new(),
            product_id,
            quantity,
            unit_price,
        });
        self
    }

    /// Sum of both payments. Saturates instead of overflowing on hostile input.
    pub fn paid_amount(&self) -> i64 {
        self.advance_paid.saturating_add(self.remaining_paid)
    }

    /// Remaining unpaid balance, never negative.
    pub fn due_amount(&self) -> i64 {
        self.total_amount.saturating_sub(self.paid_amount()).max(0)
    }

    pub fn item(&self, item_id: OrderItemId) -> Option<&OrderItem> {
        self.items.iter().find(|i| i.id == item_id)
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> OrderId {
        self.id
    }
}

impl TenantOwned for Order {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_amount_is_total_minus_payments() {
        let mut order = Order::new(TenantId::new(), "ACME", 1000);
        order.advance_paid = 200;
        assert_eq!(order.due_amount(), 800);

        order.remaining_paid = 800;
        assert_eq!(order.due_amount(), 0);
    }

    #[test]
    fn due_amount_never_goes_negative() {
        let mut order = Order::new(TenantId::new(), "ACME", 100);
        order.advance_paid = 150;
        assert_eq!(order.due_amount(), 0);
    }

    #[test]
    fn items_are_addressable_by_id() {
        let order = Order::new(TenantId::new(), "ACME", 0).with_item(ProductId::new(), 3, 10);
        let item_id = order.items[0].id;
        assert_eq!(order.item(item_id).map(|i| i.quantity), Some(3));
        assert!(order.item(OrderItemId::new()).is_none());
    }
}
