//! Category-driven distance metrics.

use std::fmt;

use rapidfuzz::distance::levenshtein;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::input::{cell_number, cell_text};
use crate::model::TransformationCategory;

/// A distance between two cells. `Unbounded` never satisfies a threshold.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub enum Distance {
    Finite(f64),
    Unbounded,
}

impl Distance {
    /// The finite value, if any.
    pub fn value(&self) -> Option<f64> {
        match self {
            Distance::Finite(v) => Some(*v),
            Distance::Unbounded => None,
        }
    }

    /// Whether this distance is within `max` (inclusive).
    pub fn within(&self, max: f64) -> bool {
        matches!(self, Distance::Finite(v) if *v <= max)
    }

    /// Cell form: a number, or the string `inf`.
    pub fn to_value(&self) -> Value {
        match self {
            Distance::Finite(v) if v.fract() == 0.0 && v.abs() < 9.0e15 => {
                Value::Number(Number::from(*v as i64))
            }
            Distance::Finite(v) => Number::from_f64(*v)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String("inf".to_string())),
            Distance::Unbounded => Value::String("inf".to_string()),
        }
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Distance::Finite(v) => write!(f, "{}", v),
            Distance::Unbounded => f.write_str("inf"),
        }
    }
}

/// How two key values are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Character-level Levenshtein distance over the text form.
    EditDistance,
    /// `|a - b|` over numbers; non-numeric values are unbounded.
    AbsoluteDifference,
    /// No comparison possible; every pair is unbounded.
    Incomparable,
}

impl DistanceMetric {
    /// The metric for a transformation category.
    pub fn for_category(category: TransformationCategory) -> Self {
        match category {
            TransformationCategory::StringBased | TransformationCategory::Algorithmic => {
                DistanceMetric::EditDistance
            }
            TransformationCategory::Numerical => DistanceMetric::AbsoluteDifference,
            TransformationCategory::General => DistanceMetric::Incomparable,
        }
    }

    /// Distance between two cells. Null on either side is unbounded.
    pub fn distance(&self, a: &Value, b: &Value) -> Distance {
        if a.is_null() || b.is_null() {
            return Distance::Unbounded;
        }
        match self {
            DistanceMetric::EditDistance => match (cell_text(a), cell_text(b)) {
                (Some(a), Some(b)) => Distance::Finite(edit_distance(&a, &b) as f64),
                _ => Distance::Unbounded,
            },
            DistanceMetric::AbsoluteDifference => match (cell_number(a), cell_number(b)) {
                (Some(a), Some(b)) => {
                    let d = (a - b).abs();
                    if d.is_finite() {
                        Distance::Finite(d)
                    } else {
                        Distance::Unbounded
                    }
                }
                _ => Distance::Unbounded,
            },
            DistanceMetric::Incomparable => Distance::Unbounded,
        }
    }
}

/// Levenshtein distance in characters.
pub fn edit_distance(a: &str, b: &str) -> usize {
    levenshtein::distance(a.chars(), b.chars())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("cat", "cot"), 1);
        assert_eq!(edit_distance("cat", "dog"), 3);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("naïve", "naive"), 1);
    }

    #[test]
    fn test_metric_for_category() {
        assert_eq!(
            DistanceMetric::for_category(TransformationCategory::Algorithmic),
            DistanceMetric::EditDistance
        );
        assert_eq!(
            DistanceMetric::for_category(TransformationCategory::Numerical),
            DistanceMetric::AbsoluteDifference
        );
        assert_eq!(
            DistanceMetric::for_category(TransformationCategory::General),
            DistanceMetric::Incomparable
        );
    }

    #[test]
    fn test_absolute_difference() {
        let metric = DistanceMetric::AbsoluteDifference;
        assert_eq!(metric.distance(&json!("10"), &json!(7.5)), Distance::Finite(2.5));
        assert_eq!(metric.distance(&json!("ten"), &json!(7.5)), Distance::Unbounded);
    }

    #[test]
    fn test_null_is_unbounded() {
        let metric = DistanceMetric::EditDistance;
        assert_eq!(metric.distance(&Value::Null, &json!("a")), Distance::Unbounded);
        assert_eq!(metric.distance(&json!("a"), &Value::Null), Distance::Unbounded);
    }

    #[test]
    fn test_ordering_and_threshold() {
        assert!(Distance::Finite(100.0) < Distance::Unbounded);
        assert!(Distance::Finite(2.0).within(2.0));
        assert!(!Distance::Finite(2.0001).within(2.0));
        assert!(!Distance::Unbounded.within(f64::MAX));
    }

    #[test]
    fn test_to_value() {
        assert_eq!(Distance::Finite(1.0).to_value(), json!(1));
        assert_eq!(Distance::Finite(0.5).to_value(), json!(0.5));
        assert_eq!(Distance::Unbounded.to_value(), json!("inf"));
    }
}
