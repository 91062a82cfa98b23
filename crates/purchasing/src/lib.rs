//! Purchasing domain module.
//!
//! Purchase orders and their status machine. Receiving (turning line items into
//! ledger credits) is orchestrated by `stockledger-infra`; this crate only decides
//! which transitions are legal.

pub mod order;

pub use order::{PurchaseOrder, PurchaseOrderId, PurchaseOrderItem, PurchaseOrderStatus};
