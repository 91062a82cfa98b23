//! Stock projection: the derived aggregate of the ledger for one (tenant, product).

use serde::{Deserialize, Serialize};

use crate::{StockTransaction, WarehouseId};

/// On-hand quantity in one warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseStock {
    pub warehouse_id: WarehouseId,
    pub quantity: i64,
}

/// Aggregated stock for one product.
///
/// Invariants (after every settled ledger mutation):
/// - `total` equals the sum of all ledger quantities for the product
/// - each warehouse entry equals the per-warehouse sum
/// - warehouses whose sum is zero have no entry
///
/// Entry order follows first appearance in the ledger and carries no other meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockProjection {
    total: i64,
    by_warehouse: Vec<WarehouseStock>,
    /// Incremental deltas folded in since the last full rescan.
    #[serde(default)]
    deltas_since_rescan: u32,
}

impl StockProjection {
    /// Full rescan: aggregate every ledger row for a product.
    ///
    /// Rows must be passed in ledger order for the warehouse ordering to be stable.
    pub fn from_transactions<'a>(transactions: impl IntoIterator<Item = &'a StockTransaction>) -> Self {
        let mut projection = Self::default();
        for tx in transactions {
            projection.add(tx.warehouse_id(), tx.quantity());
        }
        projection.by_warehouse.retain(|w| w.quantity != 0);
        projection
    }

    pub fn total(&self) -> i64 {
        self.total
    }

    pub fn warehouse_stock(&self) -> &[WarehouseStock] {
        &self.by_warehouse
    }

    pub fn quantity_in(&self, warehouse_id: WarehouseId) -> i64 {
        self.by_warehouse
            .iter()
            .find(|w| w.warehouse_id == warehouse_id)
            .map(|w| w.quantity)
            .unwrap_or(0)
    }

    pub fn deltas_since_rescan(&self) -> u32 {
        self.deltas_since_rescan
    }

    /// Fold a single ledger change into the projection.
    pub fn apply(&mut self, change: &LedgerChange) {
        let (warehouse_id, delta) = change.signed();
        self.add(warehouse_id, delta);
        self.by_warehouse.retain(|w| w.quantity != 0);
        self.deltas_since_rescan = self.deltas_since_rescan.saturating_add(1);
    }

    fn add(&mut self, warehouse_id: WarehouseId, delta: i64) {
        self.total = self.total.saturating_add(delta);
        match self.by_warehouse.iter_mut().find(|w| w.warehouse_id == warehouse_id) {
            Some(entry) => entry.quantity = entry.quantity.saturating_add(delta),
            None => self.by_warehouse.push(WarehouseStock {
                warehouse_id,
                quantity: delta,
            }),
        }
    }
}

/// A ledger mutation as seen by the projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerChange {
    Appended { warehouse_id: WarehouseId, quantity: i64 },
    Removed { warehouse_id: WarehouseId, quantity: i64 },
}

impl LedgerChange {
    pub fn appended(tx: &StockTransaction) -> Self {
        LedgerChange::Appended {
            warehouse_id: tx.warehouse_id(),
            quantity: tx.quantity(),
        }
    }

    pub fn removed(tx: &StockTransaction) -> Self {
        LedgerChange::Removed {
            warehouse_id: tx.warehouse_id(),
            quantity: tx.quantity(),
        }
    }

    fn signed(&self) -> (WarehouseId, i64) {
        match *self {
            LedgerChange::Appended { warehouse_id, quantity } => (warehouse_id, quantity),
            LedgerChange::Removed { warehouse_id, quantity } => (warehouse_id, -quantity),
        }
    }
}

/// How the ledger turns a mutation into a new projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum AggregationMode {
    /// Re-sum the whole ledger for the product on every mutation.
    #[default]
    FullRescan,
    /// Fold each change into the cached projection; every `reconcile_every`
    /// changes fall back to a full rescan.
    IncrementalDelta { reconcile_every: u32 },
}

impl AggregationMode {
    /// Next projection for `change`, or `None` when a full rescan is required.
    ///
    /// A missing `change` (explicit recompute) always requires a rescan.
    pub fn fold(&self, current: &StockProjection, change: Option<&LedgerChange>) -> Option<StockProjection> {
        let change = change?;
        match *self {
            AggregationMode::FullRescan => None,
            AggregationMode::IncrementalDelta { reconcile_every } => {
                if current.deltas_since_rescan.saturating_add(1) >= reconcile_every {
                    return None;
                }
                let mut next = current.clone();
                next.apply(change);
                Some(next)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ProductId, StockTransactionDraft, StockTransactionId, TransactionType};
    use chrono::Utc;
    use proptest::prelude::*;
    use stockledger_core::TenantId;

    fn tx(warehouse_id: WarehouseId, quantity: i64) -> StockTransaction {
        StockTransactionDraft::new(
            TenantId::new(),
            ProductId::new(),
            warehouse_id,
            TransactionType::ManualAdjust,
            quantity,
        )
        .into_transaction(StockTransactionId::new(), Utc::now())
    }

    #[test]
    fn rescan_sums_total_and_per_warehouse() {
        let a = WarehouseId::new();
        let b = WarehouseId::new();
        let projection = StockProjection::from_transactions(&[tx(a, 10), tx(b, 4), tx(a, -3)]);

        assert_eq!(projection.total(), 11);
        assert_eq!(projection.quantity_in(a), 7);
        assert_eq!(projection.quantity_in(b), 4);
        assert_eq!(projection.warehouse_stock()[0].warehouse_id, a);
        assert_eq!(projection.deltas_since_rescan(), 0);
    }

    #[test]
    fn fully_offset_warehouse_has_no_entry() {
        let a = WarehouseId::new();
        let b = WarehouseId::new();
        let projection = StockProjection::from_transactions(&[tx(a, 5), tx(b, 2), tx(a, -5)]);

        assert_eq!(projection.warehouse_stock().len(), 1);
        assert_eq!(projection.quantity_in(a), 0);
        assert_eq!(projection.total(), 2);
    }

    #[test]
    fn removal_reverses_an_append() {
        let a = WarehouseId::new();
        let row = tx(a, 8);
        let mut projection = StockProjection::default();
        projection.apply(&LedgerChange::appended(&row));
        projection.apply(&LedgerChange::removed(&row));

        assert_eq!(projection.total(), 0);
        assert!(projection.warehouse_stock().is_empty());
    }

    #[test]
    fn accumulated_stock_saturates_instead_of_overflowing() {
        let a = WarehouseId::new();
        let huge = LedgerChange::Appended {
            warehouse_id: a,
            quantity: i64::MAX,
        };
        let mut projection = StockProjection::default();
        projection.apply(&huge);
        projection.apply(&huge);

        assert_eq!(projection.total(), i64::MAX);
        assert_eq!(projection.quantity_in(a), i64::MAX);
    }

    #[test]
    fn full_rescan_mode_never_folds() {
        let change = LedgerChange::appended(&tx(WarehouseId::new(), 1));
        assert_eq!(AggregationMode::FullRescan.fold(&StockProjection::default(), Some(&change)), None);
    }

    #[test]
    fn incremental_mode_requests_rescan_at_reconcile_boundary() {
        let mode = AggregationMode::IncrementalDelta { reconcile_every: 3 };
        let w = WarehouseId::new();
        let change = LedgerChange::appended(&tx(w, 1));

        let first = mode.fold(&StockProjection::default(), Some(&change)).unwrap();
        let second = mode.fold(&first, Some(&change)).unwrap();
        assert_eq!(second.deltas_since_rescan(), 2);
        assert_eq!(mode.fold(&second, Some(&change)), None);
        assert_eq!(mode.fold(&second, None), None);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: folding every change incrementally yields the same stock as a rescan.
        #[test]
        fn incremental_fold_matches_rescan(
            moves in prop::collection::vec((0usize..3, -50i64..50, any::<bool>()), 1..40)
        ) {
            let warehouses = [WarehouseId::new(), WarehouseId::new(), WarehouseId::new()];
            let mut ledger: Vec<StockTransaction> = Vec::new();
            let mut folded = StockProjection::default();

            for (idx, qty, remove_last) in moves {
                if remove_last && !ledger.is_empty() {
                    let row = ledger.remove(ledger.len() - 1);
                    folded.apply(&LedgerChange::removed(&row));
                } else {
                    let row = tx(warehouses[idx], qty);
                    folded.apply(&LedgerChange::appended(&row));
                    ledger.push(row);
                }
            }

            let rescanned = StockProjection::from_transactions(&ledger);
            prop_assert_eq!(folded.total(), rescanned.total());
            for w in warehouses {
                prop_assert_eq!(folded.quantity_in(w), rescanned.quantity_in(w));
            }
            prop_assert!(folded.warehouse_stock().iter().all(|w| w.quantity != 0));
        }
    }
}
