//! Wiring: one guard, one ledger, and the services that share them.

use std::sync::Arc;

use stockledger_auth::TenantAccessGuard;

use crate::catalog::InventoryCatalog;
use crate::config::LedgerConfig;
use crate::consumption::{ProductionConsumptionPlanner, ProductionRunRepository};
use crate::ledger::{ProductRepository, StockLedger, TransactionRepository, WarehouseRepository};
use crate::orders::{OrderBook, OrderRepository};
use crate::receiving::{PurchaseOrderRepository, PurchaseReceivingWorkflow};
use crate::store::InMemoryRepository;

/// The persistent collections the engine runs against.
#[derive(Clone)]
pub struct Stores {
    pub transactions: TransactionRepository,
    pub products: ProductRepository,
    pub warehouses: WarehouseRepository,
    pub purchase_orders: PurchaseOrderRepository,
    pub production_runs: ProductionRunRepository,
    pub orders: OrderRepository,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            transactions: Arc::new(InMemoryRepository::new()),
            products: Arc::new(InMemoryRepository::new()),
            warehouses: Arc::new(InMemoryRepository::new()),
            purchase_orders: Arc::new(InMemoryRepository::new()),
            production_runs: Arc::new(InMemoryRepository::new()),
            orders: Arc::new(InMemoryRepository::new()),
        }
    }
}

pub struct InventoryEngine {
    ledger: Arc<StockLedger>,
    catalog: InventoryCatalog,
    receiving: PurchaseReceivingWorkflow,
    production: ProductionConsumptionPlanner,
    orders: OrderBook,
}

impl InventoryEngine {
    pub fn new(config: &LedgerConfig, stores: Stores) -> Self {
        let guard = TenantAccessGuard::new(config.role_policy());
        let ledger = Arc::new(StockLedger::new(
            stores.transactions,
            stores.products.clone(),
            stores.warehouses.clone(),
            guard.clone(),
            config.aggregation,
        ));

        tracing::info!(
            aggregation = ?config.aggregation,
            warehouse_strategy = ?config.warehouse_strategy,
            privileged_roles = ?config.privileged_roles,
            "inventory engine configured"
        );

        Self {
            catalog: InventoryCatalog::new(ledger.clone(), stores.products, stores.warehouses, guard.clone()),
            receiving: PurchaseReceivingWorkflow::new(ledger.clone(), stores.purchase_orders, guard.clone()),
            production: ProductionConsumptionPlanner::new(
                ledger.clone(),
                stores.production_runs,
                stores.orders.clone(),
                guard.clone(),
                config.warehouse_strategy.selector(),
            ),
            orders: OrderBook::new(ledger.clone(), stores.orders, guard),
            ledger,
        }
    }

    pub fn in_memory(config: &LedgerConfig) -> Self {
        Self::new(config, Stores::in_memory())
    }

    pub fn ledger(&self) -> &StockLedger {
        &self.ledger
    }

    pub fn catalog(&self) -> &InventoryCatalog {
        &self.catalog
    }

    pub fn receiving(&self) -> &PurchaseReceivingWorkflow {
        &self.receiving
    }

    pub fn production(&self) -> &ProductionConsumptionPlanner {
        &self.production
    }

    pub fn orders(&self) -> &OrderBook {
        &self.orders
    }
}
