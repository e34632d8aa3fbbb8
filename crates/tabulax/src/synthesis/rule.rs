//! Learned transformation rules.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{ExampleSet, TransformationCategory};

use super::code::GeneratedRule;
use super::numerical::ClosedFormFunction;

/// The lookup variant: a mapping built from the learned examples plus a
/// cached relationship. The oracle is supplied again at apply time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
}

/// An executable rule, one variant per synthesizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransformationRule {
    ClosedForm(ClosedFormFunction),
    Generated(GeneratedRule),
    LookupWithFallback(LookupRule),
}

impl TransformationRule {
    /// Short description for summaries.
    pub fn describe(&self) -> String {
        match self {
            TransformationRule::ClosedForm(f) => format!("{} fit: {}", f.family, f.describe()),
            TransformationRule::Generated(g) => match &g.relationship {
                Some(rel) => format!("{}-step rule program ({})", g.program.steps.len(), rel),
                None => format!("{}-step rule program", g.program.steps.len()),
            },
            TransformationRule::LookupWithFallback(l) => match &l.relationship {
                Some(rel) => format!("lookup with oracle fallback ({})", rel),
                None => "lookup with oracle fallback".to_string(),
            },
        }
    }
}

/// Everything learned from one example set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnedTransformation {
    pub category: TransformationCategory,
    /// `None` when synthesis failed; the transformation then acts as identity.
    pub rule: Option<TransformationRule>,
    pub examples: ExampleSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthesis_error: Option<String>,
}

impl LearnedTransformation {
    /// Whether applying this transformation leaves values unchanged.
    pub fn is_identity(&self) -> bool {
        self.rule.is_none()
    }

    /// Serialize as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthesis::{FunctionFamily, RuleProgram, RuleStep};

    #[test]
    fn test_json_shape() {
        let learned = LearnedTransformation {
            category: TransformationCategory::Numerical,
            rule: Some(TransformationRule::ClosedForm(ClosedFormFunction {
                family: FunctionFamily::Linear,
                coefficients: vec![2.0, 0.0],
                mse: Some(0.0),
            })),
            examples: ExampleSet::from_pairs([("1", "2")]),
            synthesis_error: None,
        };
        let json: serde_json::Value = serde_json::from_str(&learned.to_json().unwrap()).unwrap();
        assert_eq!(json["category"], "Numerical");
        assert_eq!(json["rule"]["kind"], "closed_form");
        assert_eq!(json["rule"]["family"], "linear");
        assert_eq!(json["examples"][0]["target"], "2");
        assert!(json.get("synthesis_error").is_none());
    }

    #[test]
    fn test_restores_generated_rule() {
        let learned = LearnedTransformation {
            category: TransformationCategory::StringBased,
            rule: Some(TransformationRule::Generated(GeneratedRule {
                source: r#"{"transform":[{"op":"uppercase"}]}"#.to_string(),
                program: RuleProgram::new(vec![RuleStep::Uppercase]),
                relationship: None,
            })),
            examples: ExampleSet::from_pairs([("a", "A")]),
            synthesis_error: None,
        };
        let restored = LearnedTransformation::from_json(&learned.to_json().unwrap()).unwrap();
        assert_eq!(restored, learned);
        assert_eq!(restored.rule.unwrap().describe(), "1-step rule program");
    }

    #[test]
    fn test_failed_synthesis_is_identity() {
        let learned = LearnedTransformation {
            category: TransformationCategory::Algorithmic,
            rule: None,
            examples: ExampleSet::default(),
            synthesis_error: Some("oracle unavailable".to_string()),
        };
        assert!(learned.is_identity());
    }
}
