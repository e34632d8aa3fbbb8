//! Options and reports for applying a learned transformation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::input::Record;
use crate::model::Provenance;

/// Column names written by the lookup path.
pub const OUTPUT_COLUMN: &str = "Output";
pub const PROVENANCE_COLUMN: &str = "Provenance";
pub const RELATIONSHIP_COLUMN: &str = "Relationship";

/// Prefix of the default output column for rule-based transformations.
pub const TRANSFORMED_PREFIX: &str = "transformed_";

/// Caller choices for one apply run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyOptions {
    /// Overrides `transformed_<column>` (or `Output` for the lookup path).
    pub output_column: Option<String>,
}

impl ApplyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_column(mut self, name: impl Into<String>) -> Self {
        self.output_column = Some(name.into());
        self
    }
}

/// A row that could not be transformed and kept its original value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFailure {
    /// Row index (0-based).
    pub row: usize,

    /// Original cell text.
    pub original_value: String,

    /// Why the row failed.
    pub reason: String,
}

/// Summary of an apply run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyReport {
    /// Rows visited.
    pub rows_processed: usize,

    /// Rows whose output differs from the input.
    pub rows_changed: usize,

    /// Columns that did not exist before.
    pub columns_added: usize,

    /// Per-row failures, in row order.
    pub failures: Vec<RowFailure>,

    /// Lookup path only: how many outputs came from each resolution path.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub provenance_counts: BTreeMap<Provenance, usize>,

    /// Lookup path only: the relationship used in prompts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
}

impl ApplyReport {
    pub(crate) fn new(rows_processed: usize) -> Self {
        Self {
            rows_processed,
            ..Self::default()
        }
    }

    pub(crate) fn add_failure(
        &mut self,
        row: usize,
        original_value: impl Into<String>,
        reason: impl Into<String>,
    ) {
        self.failures.push(RowFailure {
            row,
            original_value: original_value.into(),
            reason: reason.into(),
        });
    }

    /// Whether every row was transformed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Transformed records plus the run report.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedTable {
    pub records: Vec<Record>,
    pub report: ApplyReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_failures() {
        let mut report = ApplyReport::new(3);
        assert!(report.is_clean());
        report.add_failure(1, "abc", "not a number");
        assert!(!report.is_clean());
        assert_eq!(report.failures[0].row, 1);
        assert_eq!(report.rows_processed, 3);
    }

    #[test]
    fn test_report_json_omits_lookup_fields() {
        let json = serde_json::to_value(ApplyReport::new(2)).unwrap();
        assert!(json.get("provenance_counts").is_none());
        assert!(json.get("relationship").is_none());
        assert_eq!(json["rows_processed"], 2);
    }

    #[test]
    fn test_options_builder() {
        let options = ApplyOptions::new().with_output_column("Result");
        assert_eq!(options.output_column.as_deref(), Some("Result"));
    }
}
