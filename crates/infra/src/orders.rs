//! Customer order writes, each gated by the payment invariant checker.

use std::sync::Arc;

use stockledger_auth::{Actor, Operation, TenantAccessGuard};
use stockledger_core::{DomainError, DomainResult, Entity, TenantId, TenantOwned};
use stockledger_sales::{Order, OrderId, OrderStatus, PaymentInvariantChecker, PaymentKind};

use crate::ledger::StockLedger;
use crate::locks::KeyedLocks;
use crate::store::TenantRepository;

pub type OrderRepository = Arc<dyn TenantRepository<OrderId, Order>>;

pub struct OrderBook {
    ledger: Arc<StockLedger>,
    orders: OrderRepository,
    guard: TenantAccessGuard,
    checker: PaymentInvariantChecker,
    locks: KeyedLocks<(TenantId, OrderId)>,
}

impl OrderBook {
    pub fn new(ledger: Arc<StockLedger>, orders: OrderRepository, guard: TenantAccessGuard) -> Self {
        Self {
            ledger,
            orders,
            guard,
            checker: PaymentInvariantChecker,
            locks: KeyedLocks::new(),
        }
    }

    pub async fn create_order(&self, actor: &Actor, order: Order) -> DomainResult<Order> {
        let tenant_id = order.tenant_id();
        self.authorize(actor, tenant_id)?;
        self.validate(&order).await?;

        let _key = self.locks.lock((tenant_id, order.id())).await;
        self.orders.insert(tenant_id, order.id(), order.clone()).await?;

        tracing::info!(tenant_id = %tenant_id, order_id = %order.id(), total = order.total_amount, "order created");
        Ok(order)
    }

    /// Replace an order. Re-checks the payment invariants even when the status is unchanged.
    pub async fn update_order(&self, actor: &Actor, order: Order) -> DomainResult<Order> {
        let tenant_id = order.tenant_id();
        self.authorize(actor, tenant_id)?;
        self.validate(&order).await?;

        let _key = self.locks.lock((tenant_id, order.id())).await;
        self.load(tenant_id, order.id()).await?;
        self.orders.update(tenant_id, order.id(), order.clone()).await?;

        tracing::info!(tenant_id = %tenant_id, order_id = %order.id(), status = ?order.status, "order updated");
        Ok(order)
    }

    pub async fn record_payment(
        &self,
        actor: &Actor,
        tenant_id: TenantId,
        order_id: OrderId,
        kind: PaymentKind,
        amount: i64,
    ) -> DomainResult<Order> {
        self.authorize(actor, tenant_id)?;
        if amount <= 0 {
            return Err(DomainError::validation("payment amount must be positive"));
        }

        self.modify(tenant_id, order_id, |order| {
            let slot = match kind {
                PaymentKind::Advance => &mut order.advance_paid,
                PaymentKind::Remaining => &mut order.remaining_paid,
            };
            *slot = slot
                .checked_add(amount)
                .ok_or_else(|| DomainError::validation("payment amount overflows"))?;
            Ok(())
        })
        .await
    }

    /// Move an order to `delivered`. Fails with a state conflict while money is due.
    pub async fn mark_delivered(&self, actor: &Actor, tenant_id: TenantId, order_id: OrderId) -> DomainResult<Order> {
        self.authorize(actor, tenant_id)?;
        self.modify(tenant_id, order_id, |order| {
            order.status = OrderStatus::Delivered;
            Ok(())
        })
        .await
    }

    fn authorize(&self, actor: &Actor, tenant_id: TenantId) -> DomainResult<()> {
        self.guard
            .resolve(actor, Operation::WriteOrder)
            .authorize_tenant(tenant_id)?;
        Ok(())
    }

    /// Shape checks, same-tenant product references, then the payment invariants.
    async fn validate(&self, order: &Order) -> DomainResult<()> {
        if order.customer.trim().is_empty() {
            return Err(DomainError::validation("customer is required"));
        }
        for item in &order.items {
            if item.quantity <= 0 {
                return Err(DomainError::validation("order item quantity must be positive"));
            }
            if item.unit_price < 0 {
                return Err(DomainError::validation("order item price cannot be negative"));
            }
            self.ledger.product(order.tenant_id(), item.product_id).await?;
        }
        self.checker.check(order)?;
        Ok(())
    }

    async fn modify(
        &self,
        tenant_id: TenantId,
        order_id: OrderId,
        change: impl FnOnce(&mut Order) -> DomainResult<()> + Send,
    ) -> DomainResult<Order> {
        let _key = self.locks.lock((tenant_id, order_id)).await;
        let mut order = self.load(tenant_id, order_id).await?;
        change(&mut order)?;
        self.checker.check(&order)?;
        self.orders.update(tenant_id, order_id, order.clone()).await?;

        tracing::info!(
            tenant_id = %tenant_id,
            order_id = %order_id,
            status = ?order.status,
            due = order.due_amount(),
            "order updated"
        );
        Ok(order)
    }

    async fn load(&self, tenant_id: TenantId, order_id: OrderId) -> DomainResult<Order> {
        self.orders
            .get(tenant_id, &order_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("order {order_id}")))
    }
}
