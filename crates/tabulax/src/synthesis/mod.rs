//! Transformation synthesis: one synthesizer per category family.
//!
//! - [`NumericalSynthesizer`] fits closed-form functions (Numerical)
//! - [`CodeSynthesizer`] asks the oracle for a [`RuleProgram`] (String-based, Algorithmic)
//! - [`LookupInferenceEngine`] combines example lookup with oracle inference (General)

mod code;
mod lookup;
mod numerical;
mod program;
mod relationship;
mod rule;

pub use code::{CodeSynthesizer, GeneratedRule};
pub use lookup::{LookupInferenceEngine, LookupOutcome};
pub use numerical::{ClosedFormFunction, FunctionFamily, NumericalSynthesizer, format_number};
pub use program::{
    ArithmeticOp, CharClass, CompiledProgram, ProgramLimits, RuleProgram, RuleStep,
};
pub use relationship::{RELATIONSHIP_ERROR, RELATIONSHIP_UNKNOWN, name_relationship};
pub use rule::{LearnedTransformation, LookupRule, TransformationRule};
