//! Material consumption planning.

use stockledger_core::{DomainError, DomainResult};
use stockledger_inventory::{BomLine, ProductId};

/// Quantity produced when the run's order item cannot be resolved.
pub const DEFAULT_QUANTITY_TO_MAKE: i64 = 1;

/// Units of one material a run consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialRequirement {
    pub material: ProductId,
    pub quantity: i64,
}

impl MaterialRequirement {
    /// Signed ledger quantity for the debit.
    pub fn ledger_quantity(&self) -> i64 {
        -self.quantity
    }
}

/// The order item quantity when it is usable, otherwise [`DEFAULT_QUANTITY_TO_MAKE`].
pub fn resolve_quantity_to_make(order_item_quantity: Option<i64>) -> i64 {
    match order_item_quantity {
        Some(q) if q > 0 => q,
        _ => DEFAULT_QUANTITY_TO_MAKE,
    }
}

/// One requirement per BOM line: `line.quantity * quantity_to_make`.
///
/// Lines are not merged; each becomes its own ledger debit.
pub fn plan_material_consumption(bom: &[BomLine], quantity_to_make: i64) -> DomainResult<Vec<MaterialRequirement>> {
    if quantity_to_make <= 0 {
        return Err(DomainError::validation("quantity to make must be positive"));
    }

    bom.iter()
        .map(|line| {
            let quantity = line.quantity.checked_mul(quantity_to_make).ok_or_else(|| {
                DomainError::validation(format!(
                    "material {} requirement overflows ({} x {quantity_to_make})",
                    line.material, line.quantity
                ))
            })?;
            Ok(MaterialRequirement {
                material: line.material,
                quantity,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn chair_from_planks() {
        let plank = ProductId::new();
        let plan = plan_material_consumption(&[BomLine { material: plank, quantity: 2 }], 3).unwrap();

        assert_eq!(plan, vec![MaterialRequirement { material: plank, quantity: 6 }]);
        assert_eq!(plan[0].ledger_quantity(), -6);
    }

    #[test]
    fn empty_bom_plans_nothing() {
        assert!(plan_material_consumption(&[], 5).unwrap().is_empty());
    }

    #[test]
    fn unresolved_quantity_defaults_to_one() {
        assert_eq!(resolve_quantity_to_make(None), 1);
        assert_eq!(resolve_quantity_to_make(Some(0)), 1);
        assert_eq!(resolve_quantity_to_make(Some(4)), 4);
    }

    #[test]
    fn overflow_is_a_validation_error() {
        let line = BomLine { material: ProductId::new(), quantity: i64::MAX };
        assert!(matches!(plan_material_consumption(&[line], 2), Err(DomainError::Validation(_))));
    }

    proptest! {
        /// Property: every requirement is the BOM quantity scaled by the run size.
        #[test]
        fn requirements_scale_linearly(
            quantities in prop::collection::vec(1i64..1_000, 0..8),
            to_make in 1i64..1_000,
        ) {
            let bom: Vec<BomLine> = quantities
                .iter()
                .map(|q| BomLine { material: ProductId::new(), quantity: *q })
                .collect();
            let plan = plan_material_consumption(&bom, to_make).unwrap();

            prop_assert_eq!(plan.len(), bom.len());
            for (req, line) in plan.iter().zip(&bom) {
                prop_assert_eq!(req.material, line.material);
                prop_assert_eq!(req.quantity, line.quantity * to_make);
            }
        }
    }
}
