//! Transformation categories.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The four kinds of source→target transformation.
///
/// Assigned once per task by the classifier. Every consumer matches on it
/// exhaustively, so a new category cannot slip through unhandled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TransformationCategory {
    /// Text manipulation: splitting, case conversion, abbreviation.
    #[serde(rename = "String-based")]
    StringBased,
    /// A mathematical function of a numeric input.
    #[serde(rename = "Numerical")]
    Numerical,
    /// A well-defined algorithm without external knowledge (encodings, dates, hashes).
    #[serde(rename = "Algorithmic")]
    Algorithmic,
    /// Needs world knowledge; also the fallback when classification is unclear.
    #[serde(rename = "General")]
    General,
}

impl TransformationCategory {
    /// All categories, in keyword-search priority order.
    pub const ALL: [TransformationCategory; 4] = [
        TransformationCategory::StringBased,
        TransformationCategory::Numerical,
        TransformationCategory::Algorithmic,
        TransformationCategory::General,
    ];

    /// Canonical label, as used in prompts and serialized output.
    pub fn label(&self) -> &'static str {
        match self {
            TransformationCategory::StringBased => "String-based",
            TransformationCategory::Numerical => "Numerical",
            TransformationCategory::Algorithmic => "Algorithmic",
            TransformationCategory::General => "General",
        }
    }
}

impl fmt::Display for TransformationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TransformationCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .trim_matches(|c: char| c == '"' || c == '\'' || c == '.')
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect();

        match normalized.as_str() {
            "stringbased" | "string" => Ok(TransformationCategory::StringBased),
            "numerical" | "numeric" => Ok(TransformationCategory::Numerical),
            "algorithmic" => Ok(TransformationCategory::Algorithmic),
            "general" => Ok(TransformationCategory::General),
            _ => Err(format!(
                "Unknown category: {}. Use String-based, Numerical, Algorithmic, or General.",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_labels() {
        assert_eq!(
            "String-based".parse::<TransformationCategory>().unwrap(),
            TransformationCategory::StringBased
        );
        assert_eq!(
            "string_based".parse::<TransformationCategory>().unwrap(),
            TransformationCategory::StringBased
        );
        assert_eq!(
            " \"Numerical\" ".parse::<TransformationCategory>().unwrap(),
            TransformationCategory::Numerical
        );
        assert_eq!(
            "ALGORITHMIC".parse::<TransformationCategory>().unwrap(),
            TransformationCategory::Algorithmic
        );
        assert!("lookup".parse::<TransformationCategory>().is_err());
    }

    #[test]
    fn test_serde_uses_canonical_labels() {
        let json = serde_json::to_string(&TransformationCategory::StringBased).unwrap();
        assert_eq!(json, "\"String-based\"");

        let parsed: TransformationCategory = serde_json::from_str("\"General\"").unwrap();
        assert_eq!(parsed, TransformationCategory::General);
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for category in TransformationCategory::ALL {
            assert_eq!(category.to_string().parse::<TransformationCategory>(), Ok(category));
        }
    }
}
