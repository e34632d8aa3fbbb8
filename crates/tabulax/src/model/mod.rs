//! Core value types shared by every engine.

mod category;
mod example;
mod provenance;

pub use category::TransformationCategory;
pub use example::{ExamplePair, ExampleSet};
pub use provenance::Provenance;
