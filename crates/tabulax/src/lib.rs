//! TabulaX: example-driven value transformations and fuzzy table joins.
//!
//! Given a handful of source→target example pairs, TabulaX classifies the
//! transformation, synthesizes an executable rule for it, applies that rule
//! to whole columns, and joins tables approximately using a distance metric
//! chosen by the category.
//!
//! # Pipeline
//!
//! - **Classify** into String-based, Numerical, Algorithmic or General
//! - **Synthesize** a closed-form fit, a validated rule program, or a lookup
//!   table with oracle fallback
//! - **Apply** the rule per row, isolating failures
//! - **Join** with edit distance or absolute difference under a threshold
//!
//! # Example
//!
//! ```no_run
//! use tabulax::{ExampleSet, OracleConfig, OracleProvider, Tabulax};
//!
//! let config = OracleConfig::from_env(OracleProvider::Gemini).unwrap();
//! let tabulax = Tabulax::from_oracle_config(&config).unwrap();
//!
//! let examples = ExampleSet::from_pairs([("2024-01-05", "Jan 5, 2024")]);
//! let learned = tabulax.learn(&examples).unwrap();
//! println!("{}: {:?}", learned.category, learned.rule);
//! ```

pub mod classify;
pub mod error;
pub mod input;
pub mod join;
pub mod model;
pub mod oracle;
pub mod synthesis;
pub mod transform;

mod tabulax;

pub use crate::tabulax::{Tabulax, TabulaxConfig};
pub use classify::{Classification, ClassificationMethod, Classifier};
pub use error::{OracleError, Result, RuleError, TabulaxError};
pub use input::{DataTable, Parser, ParserConfig, Record};
pub use join::{Distance, DistanceMetric, FuzzyJoinEngine, JoinOutput, JoinRecord};
pub use model::{ExamplePair, ExampleSet, Provenance, TransformationCategory};
pub use oracle::{MockOracle, OracleConfig, OracleProvider, SemanticOracle, build_oracle};
pub use synthesis::{
    ClosedFormFunction, CodeSynthesizer, FunctionFamily, LearnedTransformation,
    LookupInferenceEngine, LookupOutcome, NumericalSynthesizer, ProgramLimits, RuleProgram,
    TransformationRule,
};
pub use transform::{AppliedTable, ApplyOptions, ApplyReport, TransformEngine};
