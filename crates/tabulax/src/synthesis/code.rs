//! Oracle-generated rule programs for string-based and algorithmic categories.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, RuleError, TabulaxError};
use crate::model::{ExampleSet, TransformationCategory};
use crate::oracle::reply::strip_code_fences;
use crate::oracle::{SemanticOracle, prompts};

use super::program::{CompiledProgram, ProgramLimits, RuleProgram};
use super::relationship::name_relationship;

/// The `{"transform": ...}` block in a reply.
static PROGRAM_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)\{\s*"transform"\s*:.*\}"#).unwrap());

/// A rule program produced by the oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedRule {
    /// Extracted reply text the program was parsed from.
    pub source: String,
    /// The parsed program.
    pub program: RuleProgram,
    /// Relationship named before generation (algorithmic only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
}

impl GeneratedRule {
    /// Validate and compile the program.
    pub fn compile(&self, limits: &ProgramLimits) -> std::result::Result<CompiledProgram, RuleError> {
        self.program.compile(limits)
    }
}

/// Asks the oracle for a rule program and validates it.
#[derive(Debug, Clone)]
pub struct CodeSynthesizer {
    max_examples: usize,
    limits: ProgramLimits,
}

impl CodeSynthesizer {
    /// Create a synthesizer using up to ten examples.
    pub fn new() -> Self {
        Self {
            max_examples: 10,
            limits: ProgramLimits::default(),
        }
    }

    /// Set how many leading examples go into the prompts.
    pub fn with_max_examples(mut self, max_examples: usize) -> Self {
        self.max_examples = max_examples.max(1);
        self
    }

    /// Set the program resource limits.
    pub fn with_limits(mut self, limits: ProgramLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Generate a rule for a string-based or algorithmic example set.
    pub fn synthesize(
        &self,
        oracle: &dyn SemanticOracle,
        examples: &ExampleSet,
        category: TransformationCategory,
    ) -> Result<GeneratedRule> {
        if examples.is_empty() {
            return Err(TabulaxError::InvalidRequest(
                "no valid example pairs to synthesize from".to_string(),
            ));
        }
        let pairs = examples.head(self.max_examples);

        let (prompt, relationship) = match category {
            TransformationCategory::StringBased => (prompts::string_rule_prompt(pairs), None),
            TransformationCategory::Algorithmic => {
                let relationship = name_relationship(oracle, pairs)?;
                (
                    prompts::algorithmic_rule_prompt(&relationship, pairs),
                    Some(relationship),
                )
            }
            TransformationCategory::Numerical | TransformationCategory::General => {
                return Err(TabulaxError::InvalidRequest(format!(
                    "{} transformations are not generated as rule programs",
                    category
                )));
            }
        };

        let reply = oracle.invoke(&prompt)?;
        let source = extract_rule_text(&reply);
        debug!(chars = source.len(), "extracted rule text");

        let program: RuleProgram = serde_json::from_str(&source)
            .map_err(|e| TabulaxError::Synthesis(format!("rule program did not parse: {}", e)))?;
        let compiled = program
            .compile(&self.limits)
            .map_err(|e| TabulaxError::Synthesis(format!("rule program is invalid: {}", e)))?;

        let reproduced = pairs
            .iter()
            .filter(|p| compiled.run(&p.source).ok().as_deref() == Some(p.target.as_str()))
            .count();
        if reproduced < pairs.len() {
            warn!(
                reproduced,
                total = pairs.len(),
                "generated rule does not reproduce every example"
            );
        }
        info!(
            category = %category,
            steps = compiled.len(),
            reproduced,
            "synthesized rule program"
        );

        Ok(GeneratedRule {
            source,
            program,
            relationship,
        })
    }
}

impl Default for CodeSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip fences and pick out the program block, or return the cleaned reply.
pub(crate) fn extract_rule_text(reply: &str) -> String {
    let cleaned = strip_code_fences(reply);
    match PROGRAM_BLOCK.find(&cleaned) {
        Some(m) => m.as_str().to_string(),
        None => cleaned,
    }
}
