//! Transformation classification.

mod classifier;

pub use classifier::{Classification, ClassificationMethod, Classifier};
