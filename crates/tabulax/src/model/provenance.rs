//! Per-value provenance tags for the lookup/inference path.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which resolution path produced an output value.
///
/// Lookup-derived tags (`ExactMatch`, `CaseInsensitiveMatch`) carry more
/// confidence than oracle-derived ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    ExactMatch,
    CaseInsensitiveMatch,
    LlmGenerated,
    LlmFallbackUncertain,
    LlmError,
    EmptyInput,
    NoExamplesProvided,
    ProcessingError,
}

impl Provenance {
    /// Wire label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::ExactMatch => "exact_match",
            Provenance::CaseInsensitiveMatch => "case_insensitive_match",
            Provenance::LlmGenerated => "llm_generated",
            Provenance::LlmFallbackUncertain => "llm_fallback_uncertain",
            Provenance::LlmError => "llm_error",
            Provenance::EmptyInput => "empty_input",
            Provenance::NoExamplesProvided => "no_examples_provided",
            Provenance::ProcessingError => "processing_error",
        }
    }

    /// Whether the value came straight from the example lookup table.
    pub fn is_lookup(&self) -> bool {
        matches!(self, Provenance::ExactMatch | Provenance::CaseInsensitiveMatch)
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
