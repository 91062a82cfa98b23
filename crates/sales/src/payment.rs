//! Order payment invariants.
//!
//! Checked on every persisted write of an order, not only on the transition to
//! `delivered`: a later edit to the total or the payments must not leave a
//! delivered order with money still due.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockledger_core::DomainError;

use crate::{Order, OrderStatus};

/// Which payment slot a payment is booked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    Advance,
    Remaining,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PaymentViolation {
    #[error("{field} cannot be negative (got {value})")]
    NegativeAmount { field: &'static str, value: i64 },

    #[error("payments of {paid} exceed the order total of {total}")]
    PaymentExceedsTotal { paid: i64, total: i64 },

    #[error("order cannot be delivered while {due} is still due")]
    DeliveryBlockedByDue { due: i64 },
}

impl From<PaymentViolation> for DomainError {
    fn from(value: PaymentViolation) -> Self {
        match value {
            PaymentViolation::NegativeAmount { .. } | PaymentViolation::PaymentExceedsTotal { .. } => {
                DomainError::validation(value.to_string())
            }
            PaymentViolation::DeliveryBlockedByDue { .. } => DomainError::conflict(value.to_string()),
        }
    }
}

/// Validates payment sums and delivery preconditions before an order is persisted.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaymentInvariantChecker;

impl PaymentInvariantChecker {
    /// Rules, in order:
    /// 1. `advance_paid`, `remaining_paid`, `total_amount` are non-negative
    /// 2. `advance_paid + remaining_paid <= total_amount`
    /// 3. a delivered order has nothing due
    pub fn check(&self, order: &Order) -> Result<(), PaymentViolation> {
        for (field, value) in [
            ("advance_paid", order.advance_paid),
            ("remaining_paid", order.remaining_paid),
            ("total_amount", order.total_amount),
        ] {
            if value < 0 {
                return Err(PaymentViolation::NegativeAmount { field, value });
            }
        }

        let paid = order.advance_paid as i128 + order.remaining_paid as i128;
        if paid > order.total_amount as i128 {
            return Err(PaymentViolation::PaymentExceedsTotal {
                paid: order.paid_amount(),
                total: order.total_amount,
            });
        }

        if order.status == OrderStatus::Delivered {
            let due = order.due_amount();
            if due != 0 {
                return Err(PaymentViolation::DeliveryBlockedByDue { due });
            }
        }

        Ok(())
    }
}
