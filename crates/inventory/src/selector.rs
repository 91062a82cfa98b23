//! Warehouse selection strategies.
//!
//! Neither strategy checks stock sufficiency: a debit may drive a warehouse negative.

use crate::WarehouseId;

/// A warehouse offered to a selector, with the on-hand quantity of the product
/// being moved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseCandidate {
    pub warehouse_id: WarehouseId,
    pub is_default: bool,
    pub on_hand: i64,
}

/// Picks the warehouse a ledger movement is booked against.
pub trait WarehouseSelector: Send + Sync + core::fmt::Debug {
    fn select(&self, candidates: &[WarehouseCandidate]) -> Option<WarehouseId>;
}

/// The first default warehouse, otherwise the first warehouse at all.
///
/// Several defaults are tolerated; the first in candidate order wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultThenAny;

impl WarehouseSelector for DefaultThenAny {
    fn select(&self, candidates: &[WarehouseCandidate]) -> Option<WarehouseId> {
        candidates
            .iter()
            .find(|c| c.is_default)
            .or_else(|| candidates.first())
            .map(|c| c.warehouse_id)
    }
}

/// The first warehouse already holding stock of the product, falling back to
/// [`DefaultThenAny`] when none does.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstHoldingStock;

impl WarehouseSelector for FirstHoldingStock {
    fn select(&self, candidates: &[WarehouseCandidate]) -> Option<WarehouseId> {
        candidates
            .iter()
            .find(|c| c.on_hand > 0)
            .map(|c| c.warehouse_id)
            .or_else(|| DefaultThenAny.select(candidates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(is_default: bool, on_hand: i64) -> WarehouseCandidate {
        WarehouseCandidate {
            warehouse_id: WarehouseId::new(),
            is_default,
            on_hand,
        }
    }

    #[test]
    fn default_then_any_prefers_default() {
        let candidates = vec![candidate(false, 0), candidate(true, 0), candidate(true, 0)];
        assert_eq!(DefaultThenAny.select(&candidates), Some(candidates[1].warehouse_id));
    }

    #[test]
    fn default_then_any_falls_back_to_first() {
        let candidates = vec![candidate(false, 0), candidate(false, 3)];
        assert_eq!(DefaultThenAny.select(&candidates), Some(candidates[0].warehouse_id));
    }

    #[test]
    fn no_candidates_selects_nothing() {
        assert_eq!(DefaultThenAny.select(&[]), None);
        assert_eq!(FirstHoldingStock.select(&[]), None);
    }

    #[test]
    fn first_holding_ignores_sufficiency() {
        let candidates = vec![candidate(true, 0), candidate(false, 1), candidate(false, 500)];
        assert_eq!(FirstHoldingStock.select(&candidates), Some(candidates[1].warehouse_id));
    }

    #[test]
    fn first_holding_falls_back_to_default() {
        let candidates = vec![candidate(false, -2), candidate(true, 0)];
        assert_eq!(FirstHoldingStock.select(&candidates), Some(candidates[1].warehouse_id));
    }
}
