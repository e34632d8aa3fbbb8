//! Applies a learned transformation to one column of a table.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{Result, TabulaxError};
use crate::input::{Record, cell_number, cell_text, column_values, has_column};
use crate::model::{Provenance, TransformationCategory};
use crate::oracle::SemanticOracle;
use crate::synthesis::{
    ClosedFormFunction, CompiledProgram, GeneratedRule, LearnedTransformation,
    LookupInferenceEngine, LookupRule, ProgramLimits, TransformationRule,
};

use super::operations::{
    AppliedTable, ApplyOptions, ApplyReport, OUTPUT_COLUMN, PROVENANCE_COLUMN,
    RELATIONSHIP_COLUMN, TRANSFORMED_PREFIX,
};

/// Engine for applying learned transformations to records.
///
/// Input records are never modified; the result is a new table with the
/// original columns followed by the added ones.
#[derive(Debug, Clone, Default)]
pub struct TransformEngine {
    limits: ProgramLimits,
    lookup: LookupInferenceEngine,
}

impl TransformEngine {
    /// Create a transform engine with default rule-program limits.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(mut self, limits: ProgramLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Cap how many examples the lookup path shows the oracle.
    pub fn with_lookup_examples(mut self, max_examples: Option<usize>) -> Self {
        self.lookup = self.lookup.with_max_examples(max_examples);
        self
    }

    /// Apply `learned` to `column` of `records`.
    ///
    /// Fails only when the table is empty or the column is absent. Rows that
    /// cannot be transformed keep their original value and are listed in the
    /// report.
    pub fn apply(
        &self,
        oracle: &dyn SemanticOracle,
        records: &[Record],
        column: &str,
        learned: &LearnedTransformation,
        options: &ApplyOptions,
    ) -> Result<AppliedTable> {
        if records.is_empty() {
            return Err(TabulaxError::InvalidRequest(
                "cannot apply a transformation to an empty table".to_string(),
            ));
        }
        if !has_column(records, column) {
            return Err(TabulaxError::InvalidRequest(format!(
                "column '{}' not found",
                column
            )));
        }

        let values = column_values(records, column);
        debug!(
            column,
            rows = values.len(),
            category = %learned.category,
            "applying transformation"
        );

        let lookup_rule = match &learned.rule {
            Some(TransformationRule::LookupWithFallback(rule)) => Some(rule.clone()),
            _ if learned.category == TransformationCategory::General => Some(LookupRule::default()),
            _ => None,
        };

        let applied = match lookup_rule {
            Some(rule) => self.apply_lookup(oracle, records, &values, learned, &rule, options),
            None => {
                let output_column = options
                    .output_column
                    .clone()
                    .unwrap_or_else(|| format!("{}{}", TRANSFORMED_PREFIX, column));
                let mut report = ApplyReport::new(values.len());
                let outputs = match &learned.rule {
                    Some(TransformationRule::ClosedForm(function)) => {
                        apply_closed_form(function, &values, &mut report)
                    }
                    Some(TransformationRule::Generated(rule)) => {
                        self.apply_generated(rule, &values, &mut report)
                    }
                    _ => {
                        debug!(column, "no rule learned, copying column unchanged");
                        values.clone()
                    }
                };
                report.rows_changed = values
                    .iter()
                    .zip(&outputs)
                    .filter(|(before, after)| before != after)
                    .count();
                report.columns_added = count_new_columns(records, &[output_column.as_str()]);
                let records = attach_columns(records, vec![(output_column, outputs)]);
                AppliedTable { records, report }
            }
        };

        if !applied.report.is_clean() {
            warn!(
                column,
                failures = applied.report.failures.len(),
                "some rows kept their original value"
            );
        }
        info!(
            column,
            rows = applied.report.rows_processed,
            changed = applied.report.rows_changed,
            "transformation applied"
        );
        Ok(applied)
    }

    fn apply_generated(
        &self,
        rule: &GeneratedRule,
        values: &[Value],
        report: &mut ApplyReport,
    ) -> Vec<Value> {
        let program = match rule.compile(&self.limits) {
            Ok(program) => program,
            Err(e) => {
                warn!(error = %e, "stored rule program is invalid, copying column unchanged");
                for (row, value) in values.iter().enumerate() {
                    if let Some(text) = cell_text(value) {
                        report.add_failure(row, text, e.to_string());
                    }
                }
                return values.to_vec();
            }
        };
        values
            .iter()
            .enumerate()
            .map(|(row, value)| run_program(&program, row, value, report))
            .collect()
    }

    fn apply_lookup(
        &self,
        oracle: &dyn SemanticOracle,
        records: &[Record],
        values: &[Value],
        learned: &LearnedTransformation,
        rule: &LookupRule,
        options: &ApplyOptions,
    ) -> AppliedTable {
        let outcome = self.lookup.transform_with_relationship(
            oracle,
            &learned.examples,
            rule.relationship.as_deref(),
            values,
        );

        let mut report = ApplyReport::new(values.len());
        for (row, (value, provenance)) in values.iter().zip(&outcome.provenances).enumerate() {
            let reason = match provenance {
                Provenance::ProcessingError => "value cannot be transformed",
                Provenance::LlmError => "oracle call failed",
                _ => continue,
            };
            report.add_failure(row, original_text(value), reason);
        }
        report.rows_changed = values
            .iter()
            .zip(&outcome.outputs)
            .filter(|(value, out)| original_text(value) != **out)
            .count();
        report.provenance_counts = outcome.provenance_counts();
        report.relationship = Some(outcome.relationship.clone());

        let output_column = options
            .output_column
            .clone()
            .unwrap_or_else(|| OUTPUT_COLUMN.to_string());
        report.columns_added = count_new_columns(
            records,
            &[output_column.as_str(), PROVENANCE_COLUMN, RELATIONSHIP_COLUMN],
        );

        let columns = vec![
            (
                output_column,
                outcome.outputs.into_iter().map(Value::String).collect(),
            ),
            (
                PROVENANCE_COLUMN.to_string(),
                outcome
                    .provenances
                    .iter()
                    .map(|p| Value::String(p.as_str().to_string()))
                    .collect(),
            ),
            (
                RELATIONSHIP_COLUMN.to_string(),
                vec![Value::String(outcome.relationship); values.len()],
            ),
        ];
        AppliedTable {
            records: attach_columns(records, columns),
            report,
        }
    }
}

fn apply_closed_form(
    function: &ClosedFormFunction,
    values: &[Value],
    report: &mut ApplyReport,
) -> Vec<Value> {
    values
        .iter()
        .enumerate()
        .map(|(row, value)| {
            if is_blank(value) {
                return value.clone();
            }
            match cell_number(value).and_then(|x| function.evaluate(x)) {
                Some(_) => function.apply_value(value),
                None => {
                    debug!(row, "value is not in the function's domain");
                    report.add_failure(row, original_text(value), "not a number in the function's domain");
                    value.clone()
                }
            }
        })
        .collect()
}

fn run_program(
    program: &CompiledProgram,
    row: usize,
    value: &Value,
    report: &mut ApplyReport,
) -> Value {
    let text = match value {
        Value::Null => return Value::Null,
        Value::Array(_) | Value::Object(_) => {
            report.add_failure(row, value.to_string(), "composite value");
            return value.clone();
        }
        other => cell_text(other).unwrap_or_default(),
    };
    match program.run(&text) {
        Ok(output) => Value::String(output),
        Err(e) => {
            debug!(row, error = %e, "rule program failed on row");
            report.add_failure(row, text, e.to_string());
            value.clone()
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn original_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => cell_text(other).unwrap_or_else(|| other.to_string()),
    }
}

fn count_new_columns(records: &[Record], columns: &[&str]) -> usize {
    columns
        .iter()
        .filter(|c| !has_column(records, c))
        .count()
}

/// Copy `records` and set each named column row by row.
fn attach_columns(records: &[Record], columns: Vec<(String, Vec<Value>)>) -> Vec<Record> {
    records
        .iter()
        .enumerate()
        .map(|(row, record)| {
            let mut out = record.clone();
            for (name, values) in &columns {
                let value = values.get(row).cloned().unwrap_or(Value::Null);
                out.insert(name.clone(), value);
            }
            out
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::records_from_json_str;
    use crate::model::ExampleSet;
    use crate::oracle::MockOracle;
    use crate::synthesis::{FunctionFamily, RuleProgram, RuleStep};
    use serde_json::json;

    fn table() -> Vec<Record> {
        records_from_json_str(r#"[{"x":"1"},{"x":2},{"x":"abc"},{"x":null},{"x":""}]"#).unwrap()
    }

    fn doubling() -> LearnedTransformation {
        LearnedTransformation {
            category: TransformationCategory::Numerical,
            rule: Some(TransformationRule::ClosedForm(ClosedFormFunction {
                family: FunctionFamily::Linear,
                coefficients: vec![2.0, 0.0],
                mse: Some(0.0),
            })),
            examples: ExampleSet::from_pairs([("1", "2"), ("3", "6")]),
            synthesis_error: None,
        }
    }

    // ==================== Numerical ====================

    #[test]
    fn test_closed_form_isolates_failures() {
        let oracle = MockOracle::new();
        let applied = TransformEngine::new()
            .apply(&oracle, &table(), "x", &doubling(), &ApplyOptions::default())
            .unwrap();

        let out: Vec<&Value> = applied.records.iter().map(|r| &r["transformed_x"]).collect();
        assert_eq!(out, vec![&json!("2"), &json!(4), &json!("abc"), &Value::Null, &json!("")]);
        assert_eq!(applied.report.rows_processed, 5);
        assert_eq!(applied.report.rows_changed, 2);
        assert_eq!(applied.report.columns_added, 1);
        assert_eq!(applied.report.failures.len(), 1);
        assert_eq!(applied.report.failures[0].row, 2);
        assert_eq!(oracle.call_count(), 0);
    }

    #[test]
    fn test_output_column_override() {
        let options = ApplyOptions::new().with_output_column("doubled");
        let applied = TransformEngine::new()
            .apply(&MockOracle::new(), &table(), "x", &doubling(), &options)
            .unwrap();
        assert!(applied.records[0].contains_key("doubled"));
        assert!(!applied.records[0].contains_key("transformed_x"));
    }

    #[test]
    fn test_missing_rule_copies_column() {
        let mut learned = doubling();
        learned.rule = None;
        let applied = TransformEngine::new()
            .apply(&MockOracle::new(), &table(), "x", &learned, &ApplyOptions::default())
            .unwrap();
        for record in &applied.records {
            assert_eq!(record["transformed_x"], record["x"]);
        }
        assert_eq!(applied.report.rows_changed, 0);
    }

    #[test]
    fn test_rejects_empty_table_and_missing_column() {
        let oracle = MockOracle::new();
        let engine = TransformEngine::new();
        let options = ApplyOptions::default();
        assert!(engine.apply(&oracle, &[], "x", &doubling(), &options).is_err());
        assert!(engine.apply(&oracle, &table(), "y", &doubling(), &options).is_err());
    }

    // ==================== Rule programs ====================

    #[test]
    fn test_generated_rule() {
        let learned = LearnedTransformation {
            category: TransformationCategory::StringBased,
            rule: Some(TransformationRule::Generated(GeneratedRule {
                source: String::new(),
                program: RuleProgram::new(vec![RuleStep::Uppercase]),
                relationship: None,
            })),
            examples: ExampleSet::from_pairs([("a", "A")]),
            synthesis_error: None,
        };
        let records = records_from_json_str(r#"[{"s":"ab","id":1},{"s":null,"id":2},{"s":[1],"id":3}]"#)
            .unwrap();
        let applied = TransformEngine::new()
            .apply(&MockOracle::new(), &records, "s", &learned, &ApplyOptions::default())
            .unwrap();

        assert_eq!(applied.records[0]["transformed_s"], json!("AB"));
        assert_eq!(applied.records[1]["transformed_s"], Value::Null);
        assert_eq!(applied.records[2]["transformed_s"], json!([1]));
        assert_eq!(applied.report.failures.len(), 1);
        // Original columns keep their order
        let columns: Vec<&str> = applied.records[0].keys().map(String::as_str).collect();
        assert_eq!(columns, vec!["s", "id", "transformed_s"]);
    }

    #[test]
    fn test_invalid_stored_program_keeps_values() {
        let learned = LearnedTransformation {
            category: TransformationCategory::Algorithmic,
            rule: Some(TransformationRule::Generated(GeneratedRule {
                source: String::new(),
                program: RuleProgram::new(vec![RuleStep::ToRadix { base: 99 }]),
                relationship: None,
            })),
            examples: ExampleSet::from_pairs([("1", "1")]),
            synthesis_error: None,
        };
        let records = records_from_json_str(r#"[{"n":"5"},{"n":"7"}]"#).unwrap();
        let applied = TransformEngine::new()
            .apply(&MockOracle::new(), &records, "n", &learned, &ApplyOptions::default())
            .unwrap();
        assert_eq!(applied.records[1]["transformed_n"], json!("7"));
        assert_eq!(applied.report.failures.len(), 2);
    }

    // ==================== Lookup ====================

    #[test]
    fn test_lookup_columns() {
        let learned = LearnedTransformation {
            category: TransformationCategory::General,
            rule: Some(TransformationRule::LookupWithFallback(LookupRule {
                relationship: Some("country to capital".to_string()),
            })),
            examples: ExampleSet::from_pairs([("Japan", "Tokyo"), ("India", "New Delhi")]),
            synthesis_error: None,
        };
        let oracle = MockOracle::new()
            .with_rule("New input: \"France\"", "Paris")
            .failing_on("New input: \"Oz\"");
        let records = records_from_json_str(r#"[{"c":"japan"},{"c":"France"},{"c":"Oz"}]"#).unwrap();
        let applied = TransformEngine::new()
            .apply(&oracle, &records, "c", &learned, &ApplyOptions::default())
            .unwrap();

        let outputs: Vec<&Value> = applied.records.iter().map(|r| &r["Output"]).collect();
        assert_eq!(outputs, vec![&json!("Tokyo"), &json!("Paris"), &json!("Oz")]);
        assert_eq!(applied.records[0]["Provenance"], json!("case_insensitive_match"));
        assert_eq!(applied.records[2]["Provenance"], json!("llm_error"));
        assert_eq!(applied.records[1]["Relationship"], json!("country to capital"));
        assert_eq!(applied.report.columns_added, 3);
        assert_eq!(applied.report.rows_changed, 2);
        assert_eq!(applied.report.failures.len(), 1);
        assert_eq!(applied.report.provenance_counts[&Provenance::LlmGenerated], 1);
        // Cached relationship: no naming call
        assert_eq!(oracle.call_count(), 2);
    }
}
