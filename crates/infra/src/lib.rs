//! Infrastructure layer: stores, locks, config, and the ledger services.

pub mod catalog;
pub mod config;
pub mod consumption;
pub mod engine;
pub mod ledger;
pub mod locks;
pub mod orders;
pub mod receiving;
pub mod store;


pub use catalog::InventoryCatalog;
pub use config::{ConfigError, LedgerConfig, WarehouseStrategy};
pub use consumption::ProductionConsumptionPlanner;
pub use engine::{InventoryEngine, Stores};
pub use ledger::{StockLedger, TransactionQuery};
pub use orders::OrderBook;
pub use receiving::PurchaseReceivingWorkflow;
pub use store::{InMemoryRepository, StoreError, TenantRepository};
