//! Lookup-table inference with oracle fallback for the General category.
//!
//! Resolution order per input value:
//!
//! 1. empty or missing input → empty output (`empty_input`)
//! 2. exact match against example sources (`exact_match`)
//! 3. lowercase match (`case_insensitive_match`)
//! 4. oracle prediction (`llm_generated`, or `llm_fallback_uncertain` when
//!    the oracle echoes the input or answers blank)
//! 5. oracle failure → original input (`llm_error`)
//!
//! Oracle calls are issued one value at a time and a failure only affects
//! that value.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::input::cell_text;
use crate::model::{ExamplePair, ExampleSet, Provenance};
use crate::oracle::reply::unquote;
use crate::oracle::{SemanticOracle, prompts};

use super::relationship::{RELATIONSHIP_ERROR, RELATIONSHIP_UNKNOWN, name_relationship};

/// Outputs of a lookup run, aligned with the inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupOutcome {
    pub outputs: Vec<String>,
    pub provenances: Vec<Provenance>,
    pub relationship: String,
}

impl LookupOutcome {
    /// How many outputs came from each resolution path.
    pub fn provenance_counts(&self) -> BTreeMap<Provenance, usize> {
        let mut counts = BTreeMap::new();
        for p in &self.provenances {
            *counts.entry(*p).or_insert(0) += 1;
        }
        counts
    }
}

/// Exact and lowercased source→target maps. Later pairs overwrite earlier ones.
struct LookupTable {
    exact: HashMap<String, String>,
    lowered: HashMap<String, String>,
}

impl LookupTable {
    fn build(pairs: &[ExamplePair]) -> Self {
        let mut exact = HashMap::with_capacity(pairs.len());
        let mut lowered = HashMap::with_capacity(pairs.len());
        for pair in pairs {
            exact.insert(pair.source.clone(), pair.target.clone());
            lowered.insert(pair.source.to_lowercase(), pair.target.clone());
        }
        Self { exact, lowered }
    }

    fn resolve(&self, value: &str) -> Option<(&str, Provenance)> {
        if let Some(target) = self.exact.get(value) {
            return Some((target.as_str(), Provenance::ExactMatch));
        }
        self.lowered
            .get(&value.to_lowercase())
            .map(|target| (target.as_str(), Provenance::CaseInsensitiveMatch))
    }
}

/// Hybrid lookup/inference engine.
#[derive(Debug, Clone, Default)]
pub struct LookupInferenceEngine {
    max_examples: Option<usize>,
}

impl LookupInferenceEngine {
    /// Create an engine that shows every example to the oracle.
    pub fn new() -> Self {
        Self { max_examples: None }
    }

    /// Cap how many examples go into oracle prompts. Lookups still use all.
    pub fn with_max_examples(mut self, max_examples: Option<usize>) -> Self {
        self.max_examples = max_examples.map(|n| n.max(1));
        self
    }

    /// Build examples from parallel source/target columns and transform.
    pub fn transform_columns(
        &self,
        oracle: &dyn SemanticOracle,
        source: &[Value],
        target: &[Value],
        inputs: &[Value],
    ) -> LookupOutcome {
        let examples = ExampleSet::from_columns(source, target);
        self.transform(oracle, &examples, inputs)
    }

    /// Transform every input, naming the relationship first.
    pub fn transform(
        &self,
        oracle: &dyn SemanticOracle,
        examples: &ExampleSet,
        inputs: &[Value],
    ) -> LookupOutcome {
        self.transform_with_relationship(oracle, examples, None, inputs)
    }

    /// Transform every input, reusing `relationship` if already known.
    pub fn transform_with_relationship(
        &self,
        oracle: &dyn SemanticOracle,
        examples: &ExampleSet,
        relationship: Option<&str>,
        inputs: &[Value],
    ) -> LookupOutcome {
        if examples.is_empty() {
            warn!(
                inputs = inputs.len(),
                "no valid example pairs, returning inputs unchanged"
            );
            return LookupOutcome {
                outputs: inputs.iter().map(passthrough_text).collect(),
                provenances: vec![Provenance::NoExamplesProvided; inputs.len()],
                relationship: RELATIONSHIP_UNKNOWN.to_string(),
            };
        }

        let table = LookupTable::build(examples.pairs());
        let prompt_pairs = match self.max_examples {
            Some(n) => examples.head(n),
            None => examples.pairs(),
        };

        let relationship = match relationship {
            Some(known) => known.to_string(),
            None => match name_relationship(oracle, prompt_pairs) {
                Ok(named) => named,
                Err(e) => {
                    warn!(error = %e, "relationship naming failed");
                    RELATIONSHIP_ERROR.to_string()
                }
            },
        };

        let mut outputs = Vec::with_capacity(inputs.len());
        let mut provenances = Vec::with_capacity(inputs.len());
        for (row, input) in inputs.iter().enumerate() {
            let (output, provenance) =
                self.resolve(oracle, &table, prompt_pairs, &relationship, row, input);
            outputs.push(output);
            provenances.push(provenance);
        }

        let outcome = LookupOutcome {
            outputs,
            provenances,
            relationship,
        };
        info!(
            inputs = inputs.len(),
            relationship = %outcome.relationship,
            counts = ?outcome.provenance_counts(),
            "lookup inference finished"
        );
        outcome
    }

    fn resolve(
        &self,
        oracle: &dyn SemanticOracle,
        table: &LookupTable,
        pairs: &[ExamplePair],
        relationship: &str,
        row: usize,
        input: &Value,
    ) -> (String, Provenance) {
        let text = match input {
            Value::Null => return (String::new(), Provenance::EmptyInput),
            Value::Array(_) | Value::Object(_) => {
                warn!(row, "composite cell cannot be transformed");
                return (input.to_string(), Provenance::ProcessingError);
            }
            other => cell_text(other).unwrap_or_default(),
        };
        let value = text.trim();
        if value.is_empty() {
            return (String::new(), Provenance::EmptyInput);
        }

        if let Some((target, provenance)) = table.resolve(value) {
            return (target.to_string(), provenance);
        }

        let prompt = prompts::prediction_prompt(relationship, pairs, value);
        match oracle.invoke(&prompt) {
            Ok(reply) => {
                let predicted = unquote(&reply);
                if predicted.is_empty() || predicted == value {
                    debug!(row, "oracle uncertain, keeping input");
                    (value.to_string(), Provenance::LlmFallbackUncertain)
                } else {
                    (predicted.to_string(), Provenance::LlmGenerated)
                }
            }
            Err(e) => {
                warn!(row, error = %e, "oracle inference failed for value");
                (value.to_string(), Provenance::LlmError)
            }
        }
    }
}

fn passthrough_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => cell_text(other).unwrap_or_else(|| other.to_string()),
    }
}
