//! Oracle-backed transformation classifier.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::model::{ExampleSet, TransformationCategory};
use crate::oracle::prompts;
use crate::oracle::reply::parse_json_reply;
use crate::oracle::SemanticOracle;

/// Matches `category: X` or `category = "X"` lines.
static CATEGORY_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?im)^\W*category\W*\s*[:=]\s*["'*]*([A-Za-z][A-Za-z _-]*)"#).unwrap()
});

/// Keywords searched for, in priority order, when the reply is unstructured.
const KEYWORDS: [(&str, TransformationCategory); 4] = [
    ("string-based", TransformationCategory::StringBased),
    ("numerical", TransformationCategory::Numerical),
    ("algorithmic", TransformationCategory::Algorithmic),
    ("general", TransformationCategory::General),
];

/// How a classification was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationMethod {
    /// Parsed from a structured (JSON or key-value) reply.
    Structured,
    /// Found by keyword search in a free-text reply.
    Keyword,
    /// Nothing recognisable in the reply, or no examples; defaulted to General.
    Fallback,
    /// The oracle call failed; defaulted to General.
    OracleError,
}

/// Result of classifying an example set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: TransformationCategory,
    pub method: ClassificationMethod,
    /// Raw oracle reply, if one was received.
    pub reply: Option<String>,
}

impl Classification {
    fn fallback(method: ClassificationMethod, reply: Option<String>) -> Self {
        Self {
            category: TransformationCategory::General,
            method,
            reply,
        }
    }

    /// Whether the category came from the reply rather than a default.
    pub fn is_confident(&self) -> bool {
        matches!(
            self.method,
            ClassificationMethod::Structured | ClassificationMethod::Keyword
        )
    }
}

#[derive(Deserialize)]
struct CategoryReply {
    category: String,
}

/// Assigns an example set to one of the four categories.
///
/// Never fails: unreadable replies and oracle errors both degrade to
/// [`TransformationCategory::General`].
#[derive(Debug, Clone)]
pub struct Classifier {
    sample_size: usize,
}

impl Classifier {
    /// Create a classifier sampling the first five pairs.
    pub fn new() -> Self {
        Self { sample_size: 5 }
    }

    /// Set how many leading pairs go into the prompt.
    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size.max(1);
        self
    }

    /// Classify the example set.
    pub fn classify(&self, oracle: &dyn SemanticOracle, examples: &ExampleSet) -> Classification {
        if examples.is_empty() {
            warn!("no valid example pairs to classify, defaulting to General");
            return Classification::fallback(ClassificationMethod::Fallback, None);
        }

        let sample = examples.head(self.sample_size);
        let prompt = prompts::classification_prompt(sample);
        debug!(pairs = sample.len(), oracle = oracle.name(), "classifying");

        let reply = match oracle.invoke(&prompt) {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "classification oracle call failed, defaulting to General");
                return Classification::fallback(ClassificationMethod::OracleError, None);
            }
        };

        let classification = match parse_reply(&reply) {
            Some((category, method)) => Classification {
                category,
                method,
                reply: Some(reply),
            },
            None => {
                warn!("unrecognised classification reply, defaulting to General");
                Classification::fallback(ClassificationMethod::Fallback, Some(reply))
            }
        };

        info!(
            category = %classification.category,
            method = ?classification.method,
            "classified transformation"
        );
        classification
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a reply: structured first, then keywords.
pub(crate) fn parse_reply(reply: &str) -> Option<(TransformationCategory, ClassificationMethod)> {
    if let Some(category) = parse_structured(reply) {
        return Some((category, ClassificationMethod::Structured));
    }
    let lowered = reply.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|&(_, category)| (category, ClassificationMethod::Keyword))
}

fn parse_structured(reply: &str) -> Option<TransformationCategory> {
    if let Ok(parsed) = parse_json_reply::<CategoryReply>(reply) {
        if let Ok(category) = parsed.category.parse() {
            return Some(category);
        }
    }
    if let Some(caps) = CATEGORY_LINE.captures(reply) {
        if let Ok(category) = caps[1].parse() {
            return Some(category);
        }
    }
    reply.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::MockOracle;

    fn examples() -> ExampleSet {
        ExampleSet::from_pairs([("john smith", "J. Smith"), ("ada lovelace", "A. Lovelace")])
    }

    #[test]
    fn test_parse_json_reply() {
        assert_eq!(
            parse_reply("```json\n{\"category\": \"Numerical\"}\n```"),
            Some((TransformationCategory::Numerical, ClassificationMethod::Structured))
        );
    }

    #[test]
    fn test_parse_key_value_reply() {
        assert_eq!(
            parse_reply("Category: Algorithmic\nReason: base64"),
            Some((TransformationCategory::Algorithmic, ClassificationMethod::Structured))
        );
    }

    #[test]
    fn test_parse_bare_label() {
        assert_eq!(
            parse_reply("  String-based\n"),
            Some((TransformationCategory::StringBased, ClassificationMethod::Structured))
        );
    }

    #[test]
    fn test_keyword_priority() {
        // Both names appear; String-based outranks Numerical
        let reply = "It is not Numerical, it is String-based manipulation.";
        assert_eq!(
            parse_reply(reply),
            Some((TransformationCategory::StringBased, ClassificationMethod::Keyword))
        );
    }

    #[test]
    fn test_unrecognised_reply() {
        assert_eq!(parse_reply("I am not sure."), None);
    }

    #[test]
    fn test_classify_structured() {
        let oracle = MockOracle::new().with_default(r#"{"category": "String-based"}"#);
        let result = Classifier::new().classify(&oracle, &examples());
        assert_eq!(result.category, TransformationCategory::StringBased);
        assert!(result.is_confident());
    }

    #[test]
    fn test_classify_oracle_failure_is_general() {
        let oracle = MockOracle::new().failing_on("Classify");
        let result = Classifier::new().classify(&oracle, &examples());
        assert_eq!(result.category, TransformationCategory::General);
        assert_eq!(result.method, ClassificationMethod::OracleError);
    }

    #[test]
    fn test_classify_garbage_is_general() {
        let oracle = MockOracle::new().with_default("¯\\_(ツ)_/¯");
        let result = Classifier::new().classify(&oracle, &examples());
        assert_eq!(result.category, TransformationCategory::General);
        assert_eq!(result.method, ClassificationMethod::Fallback);
    }

    #[test]
    fn test_classify_samples_first_five() {
        let pairs: Vec<(String, String)> =
            (0..8).map(|i| (format!("in{}", i), format!("out{}", i))).collect();
        let oracle = MockOracle::new().with_default("General");
        Classifier::new().classify(&oracle, &ExampleSet::from_pairs(pairs));

        let prompt = &oracle.prompts()[0];
        assert!(prompt.contains("\"in4\""));
        assert!(!prompt.contains("\"in5\""));
    }

    #[test]
    fn test_empty_examples_skip_oracle() {
        let oracle = MockOracle::new();
        let result = Classifier::new().classify(&oracle, &ExampleSet::default());
        assert_eq!(result.category, TransformationCategory::General);
        assert_eq!(oracle.call_count(), 0);
    }
}
