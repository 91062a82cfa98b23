//! Inventory domain module.
//!
//! Products, warehouses, the immutable stock transaction record and the stock
//! projection derived from it. Everything here is deterministic domain logic
//! (no IO, no HTTP, no storage); the ledger service in `stockledger-infra`
//! drives it.

pub mod product;
pub mod projection;
pub mod selector;
pub mod transaction;
pub mod warehouse;

pub use product::{BomLine, Product, ProductId, ProductType};
pub use projection::{AggregationMode, LedgerChange, StockProjection, WarehouseStock};
pub use selector::{DefaultThenAny, FirstHoldingStock, WarehouseCandidate, WarehouseSelector};
pub use transaction::{
    MAX_ABS_QUANTITY, StockTransaction, StockTransactionDraft, StockTransactionId, TransactionType,
};
pub use warehouse::{Warehouse, WarehouseId};
