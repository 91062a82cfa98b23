//! Sales domain module.
//!
//! Customer orders and the payment invariants that gate delivery.

pub mod order;
pub mod payment;

pub use order::{Order, OrderId, OrderItem, OrderItemId, OrderStatus};
pub use payment::{PaymentInvariantChecker, PaymentKind, PaymentViolation};
