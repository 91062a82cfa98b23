//! Production domain module.
//!
//! Production runs, their stage lifecycle, and the pure planning step that turns
//! a bill of materials into material debits.

pub mod planner;
pub mod run;

pub use planner::{DEFAULT_QUANTITY_TO_MAKE, MaterialRequirement, plan_material_consumption, resolve_quantity_to_make};
pub use run::{ProductionRun, ProductionRunId, ProductionRunStatus, ProductionStage};
