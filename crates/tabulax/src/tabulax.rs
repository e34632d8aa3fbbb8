//! Main Tabulax struct and public API.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::classify::{Classification, Classifier};
use crate::error::{Result, TabulaxError};
use crate::input::Record;
use crate::join::{FuzzyJoinEngine, JoinOutput};
use crate::model::{ExampleSet, TransformationCategory};
use crate::oracle::{OracleConfig, SemanticOracle, build_oracle};
use crate::synthesis::{
    CodeSynthesizer, LearnedTransformation, LookupInferenceEngine, LookupOutcome, LookupRule,
    NumericalSynthesizer, ProgramLimits, TransformationRule, name_relationship,
};
use crate::transform::{AppliedTable, ApplyOptions, TransformEngine};

/// Engine knobs.
#[derive(Debug, Clone)]
pub struct TabulaxConfig {
    /// Pairs shown to the classifier.
    pub classifier_sample: usize,
    /// Pairs shown to the rule generator.
    pub synthesis_examples: usize,
    /// Pairs shown to the oracle on the lookup path (None = all).
    pub lookup_examples: Option<usize>,
    /// Default join threshold.
    pub max_distance: f64,
    /// Resource bounds for generated rule programs.
    pub limits: ProgramLimits,
}

impl Default for TabulaxConfig {
    fn default() -> Self {
        Self {
            classifier_sample: 5,
            synthesis_examples: 10,
            lookup_examples: None,
            max_distance: 2.0,
            limits: ProgramLimits::default(),
        }
    }
}

/// Learns transformations from examples and applies them to tables.
///
/// ```no_run
/// use tabulax::{ExampleSet, MockOracle, Tabulax};
///
/// let tabulax = Tabulax::new(MockOracle::new());
/// let examples = ExampleSet::from_pairs([("1", "2"), ("2", "4"), ("3", "6")]);
/// let learned = tabulax.learn(&examples).unwrap();
/// println!("{}", learned.category);
/// ```
pub struct Tabulax {
    config: TabulaxConfig,
    oracle: Arc<dyn SemanticOracle>,
}

impl Tabulax {
    /// Create an instance with default configuration.
    pub fn new(oracle: impl SemanticOracle + 'static) -> Self {
        Self::from_arc(Arc::new(oracle))
    }

    /// Create an instance sharing an existing oracle.
    pub fn from_arc(oracle: Arc<dyn SemanticOracle>) -> Self {
        Self {
            config: TabulaxConfig::default(),
            oracle,
        }
    }

    /// Build the oracle from configuration.
    pub fn from_oracle_config(config: &OracleConfig) -> Result<Self> {
        let oracle: Arc<dyn SemanticOracle> = Arc::from(build_oracle(config)?);
        Ok(Self::from_arc(oracle))
    }

    pub fn with_config(mut self, config: TabulaxConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &TabulaxConfig {
        &self.config
    }

    pub fn oracle(&self) -> &dyn SemanticOracle {
        self.oracle.as_ref()
    }

    /// Classify an example set. Never fails; unclear cases become General.
    pub fn classify(&self, examples: &ExampleSet) -> Classification {
        Classifier::new()
            .with_sample_size(self.config.classifier_sample)
            .classify(self.oracle(), examples)
    }

    /// Classify, then run the one synthesizer the category calls for.
    ///
    /// Synthesis failures do not fail the call: they are recorded in
    /// `synthesis_error` and the transformation acts as identity.
    pub fn learn(&self, examples: &ExampleSet) -> Result<LearnedTransformation> {
        if examples.is_empty() {
            return Err(TabulaxError::InvalidRequest(
                "no valid example pairs".to_string(),
            ));
        }

        let classification = self.classify(examples);
        let category = classification.category;

        let synthesized: Result<TransformationRule> = match category {
            TransformationCategory::Numerical => NumericalSynthesizer::new()
                .fit(examples)
                .map(TransformationRule::ClosedForm),
            TransformationCategory::StringBased | TransformationCategory::Algorithmic => {
                CodeSynthesizer::new()
                    .with_max_examples(self.config.synthesis_examples)
                    .with_limits(self.config.limits.clone())
                    .synthesize(self.oracle(), examples, category)
                    .map(TransformationRule::Generated)
            }
            TransformationCategory::General => Ok(TransformationRule::LookupWithFallback(
                self.lookup_rule(examples),
            )),
        };

        let (rule, synthesis_error) = match synthesized {
            Ok(rule) => {
                info!(category = %category, rule = %rule.describe(), "learned transformation");
                (Some(rule), None)
            }
            Err(e) => {
                warn!(category = %category, error = %e, "synthesis failed, rule is identity");
                (None, Some(e.to_string()))
            }
        };

        Ok(LearnedTransformation {
            category,
            rule,
            examples: examples.clone(),
            synthesis_error,
        })
    }

    /// Learn from parallel source/target columns.
    pub fn learn_columns(&self, source: &[Value], target: &[Value]) -> Result<LearnedTransformation> {
        self.learn(&ExampleSet::from_columns(source, target))
    }

    /// Apply a learned transformation to one column of a table.
    pub fn apply(
        &self,
        records: &[Record],
        column: &str,
        learned: &LearnedTransformation,
        options: &ApplyOptions,
    ) -> Result<AppliedTable> {
        TransformEngine::new()
            .with_limits(self.config.limits.clone())
            .with_lookup_examples(self.config.lookup_examples)
            .apply(self.oracle(), records, column, learned, options)
    }

    /// Lookup with oracle fallback over raw example columns.
    pub fn transform_values(
        &self,
        source: &[Value],
        target: &[Value],
        inputs: &[Value],
    ) -> LookupOutcome {
        LookupInferenceEngine::new()
            .with_max_examples(self.config.lookup_examples)
            .transform_columns(self.oracle(), source, target, inputs)
    }

    /// Fuzzy left join using the metric for `category`.
    ///
    /// `max_distance` defaults to the configured threshold.
    pub fn fuzzy_join(
        &self,
        source: &[Record],
        target: &[Record],
        source_key: &str,
        target_key: &str,
        category: TransformationCategory,
        max_distance: Option<f64>,
    ) -> Result<JoinOutput> {
        FuzzyJoinEngine::new(category).join(
            source,
            target,
            source_key,
            target_key,
            max_distance.unwrap_or(self.config.max_distance),
        )
    }

    /// Name the relationship once so applying does not ask again.
    fn lookup_rule(&self, examples: &ExampleSet) -> LookupRule {
        let pairs = match self.config.lookup_examples {
            Some(n) => examples.head(n.max(1)),
            None => examples.pairs(),
        };
        match name_relationship(self.oracle(), pairs) {
            Ok(relationship) => LookupRule {
                relationship: Some(relationship),
            },
            Err(e) => {
                warn!(error = %e, "relationship naming failed, will retry when applied");
                LookupRule::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::records_from_json_str;
    use crate::oracle::MockOracle;
    use serde_json::json;

    fn classifying(category: &str) -> MockOracle {
        MockOracle::new().with_rule(
            "Classify the transformation",
            format!("{{\"category\": \"{}\"}}", category),
        )
    }

    #[test]
    fn test_learn_numerical() {
        let tabulax = Tabulax::new(classifying("Numerical"));
        let examples = ExampleSet::from_pairs([("1", "2"), ("2", "4"), ("3", "6")]);
        let learned = tabulax.learn(&examples).unwrap();

        assert_eq!(learned.category, TransformationCategory::Numerical);
        match learned.rule {
            Some(TransformationRule::ClosedForm(ref f)) => assert_eq!(f.apply("10"), "20"),
            ref other => panic!("expected closed form, got {:?}", other),
        }
    }

    #[test]
    fn test_numeric_failure_keeps_category() {
        let tabulax = Tabulax::new(classifying("Numerical"));
        let examples = ExampleSet::from_pairs([("1", "one"), ("2", "two")]);
        let learned = tabulax.learn(&examples).unwrap();

        assert_eq!(learned.category, TransformationCategory::Numerical);
        assert!(learned.is_identity());
        assert!(learned.synthesis_error.is_some());
    }

    #[test]
    fn test_learn_string_rule() {
        let oracle = classifying("String-based").with_rule(
            "Write a rule program",
            r#"{"transform": [{"op": "uppercase"}]}"#,
        );
        let tabulax = Tabulax::new(oracle);
        let learned = tabulax
            .learn(&ExampleSet::from_pairs([("ab", "AB"), ("cd", "CD")]))
            .unwrap();
        assert_eq!(learned.category, TransformationCategory::StringBased);
        assert!(matches!(learned.rule, Some(TransformationRule::Generated(_))));
    }

    #[test]
    fn test_learn_general_caches_relationship() {
        let oracle = classifying("General")
            .with_rule("Name the relationship", "country to capital");
        let tabulax = Tabulax::new(oracle);
        let learned = tabulax
            .learn(&ExampleSet::from_pairs([("Japan", "Tokyo")]))
            .unwrap();
        assert_eq!(
            learned.rule,
            Some(TransformationRule::LookupWithFallback(LookupRule {
                relationship: Some("country to capital".to_string()),
            }))
        );
    }

    #[test]
    fn test_learn_rejects_empty_examples() {
        let tabulax = Tabulax::new(MockOracle::new());
        assert!(tabulax.learn(&ExampleSet::default()).is_err());
    }

    #[test]
    fn test_fuzzy_join_default_threshold() {
        let tabulax = Tabulax::new(MockOracle::new());
        let source = records_from_json_str(r#"[{"k":"cat"}]"#).unwrap();
        let target = records_from_json_str(r#"[{"k":"cart"}]"#).unwrap();
        let output = tabulax
            .fuzzy_join(&source, &target, "k", "k", TransformationCategory::StringBased, None)
            .unwrap();
        assert_eq!(output.matched_count(), 1);
    }

    #[test]
    fn test_transform_values_without_examples() {
        let oracle = Arc::new(MockOracle::new());
        let tabulax = Tabulax::from_arc(oracle.clone());
        let outcome = tabulax.transform_values(&[], &[], &[json!("x")]);
        assert_eq!(outcome.outputs, vec!["x"]);
        assert_eq!(oracle.call_count(), 0);
    }
}
