//! Applying learned transformations to tables.

mod engine;
mod operations;

pub use engine::TransformEngine;
pub use operations::{
    AppliedTable, ApplyOptions, ApplyReport, OUTPUT_COLUMN, PROVENANCE_COLUMN,
    RELATIONSHIP_COLUMN, RowFailure, TRANSFORMED_PREFIX,
};
