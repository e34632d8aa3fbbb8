//! End-to-end tests: parse a table, learn, apply, join, write back.
//!
//! Every oracle interaction goes through `MockOracle`; nothing here touches
//! the network.

use std::io::Write;
use std::sync::Arc;

use serde_json::{Value, json};
use tempfile::{NamedTempFile, TempDir};

use tabulax::input::{column_values, records_from_json_file, write_delimited, write_json};
use tabulax::{
    ApplyOptions, ExampleSet, LearnedTransformation, MockOracle, Parser, Provenance, Record,
    Tabulax, TransformationCategory, TransformationRule,
};

/// Helper to create a temporary file with given content.
fn create_test_file(content: &str, suffix: &str) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(suffix).expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file
}

fn parse_records(content: &str, suffix: &str) -> Vec<Record> {
    let file = create_test_file(content, suffix);
    Parser::new()
        .parse_file(file.path())
        .expect("Failed to parse")
        .to_records()
}

fn classifying(category: &str) -> MockOracle {
    MockOracle::new().with_rule(
        "Classify the transformation",
        format!("{{\"category\": \"{}\"}}", category),
    )
}

// =============================================================================
// Numerical
// =============================================================================

#[test]
fn test_numerical_learn_and_apply() {
    let examples = parse_records("celsius,fahrenheit\n0,32\n100,212\n37,98.6\n-40,-40\n", ".csv");
    let tabulax = Tabulax::new(classifying("Numerical"));

    let learned = tabulax
        .learn_columns(
            &column_values(&examples, "celsius"),
            &column_values(&examples, "fahrenheit"),
        )
        .unwrap();
    assert_eq!(learned.category, TransformationCategory::Numerical);

    let table = parse_records("city\ttemp\nOslo\t10\nCairo\tNA\nLima\twarm\n", ".tsv");
    let applied = tabulax
        .apply(&table, "temp", &learned, &ApplyOptions::default())
        .unwrap();

    assert_eq!(applied.records[0]["transformed_temp"], json!("50"));
    assert_eq!(applied.records[1]["transformed_temp"], Value::Null);
    assert_eq!(applied.records[2]["transformed_temp"], json!("warm"));
    assert_eq!(applied.report.failures.len(), 1);
    assert_eq!(applied.report.failures[0].original_value, "warm");
}

// =============================================================================
// Rule programs
// =============================================================================

#[test]
fn test_algorithmic_learn_save_reload_apply() {
    let oracle = classifying("Algorithmic")
        .with_rule("Name the relationship", "decimal number to binary string")
        .with_rule(
            "Write a rule program",
            "```json\n{\"transform\": [{\"op\": \"to_radix\", \"base\": 2}]}\n```",
        );
    let tabulax = Tabulax::new(oracle);
    let learned = tabulax
        .learn(&ExampleSet::from_pairs([("2", "10"), ("5", "101"), ("8", "1000")]))
        .unwrap();
    assert!(learned.synthesis_error.is_none());

    let dir = TempDir::new().unwrap();
    let rule_path = dir.path().join("rule.json");
    std::fs::write(&rule_path, learned.to_json().unwrap()).unwrap();
    let restored =
        LearnedTransformation::from_json(&std::fs::read_to_string(&rule_path).unwrap()).unwrap();
    assert_eq!(restored, learned);

    let table = parse_records("n\n3\n16\n", ".csv");
    let applied = tabulax
        .apply(&table, "n", &restored, &ApplyOptions::new().with_output_column("bits"))
        .unwrap();
    assert_eq!(applied.records[0]["bits"], json!("11"));
    assert_eq!(applied.records[1]["bits"], json!("10000"));
    assert!(applied.report.is_clean());
}

#[test]
fn test_unusable_rule_reply_is_recorded_not_fatal() {
    let oracle = classifying("String-based").with_rule("Write a rule program", "def f(x): return x");
    let tabulax = Tabulax::new(oracle);
    let learned = tabulax
        .learn(&ExampleSet::from_pairs([("a b", "A B")]))
        .unwrap();

    assert_eq!(learned.category, TransformationCategory::StringBased);
    assert!(learned.is_identity());
    assert!(learned.synthesis_error.is_some());

    let table = parse_records("name\nx y\n", ".csv");
    let applied = tabulax
        .apply(&table, "name", &learned, &ApplyOptions::default())
        .unwrap();
    assert_eq!(applied.records[0]["transformed_name"], json!("x y"));
}

// =============================================================================
// General (lookup with oracle fallback)
// =============================================================================

#[test]
fn test_general_end_to_end() {
    let oracle = Arc::new(
        classifying("General")
            .with_rule("Name the relationship", "Relationship: country to capital")
            .with_rule("New input: \"Peru\"", "Lima"),
    );
    let tabulax = Tabulax::from_arc(oracle.clone());
    let learned = tabulax
        .learn(&ExampleSet::from_pairs([("Japan", "Tokyo"), ("Kenya", "Nairobi")]))
        .unwrap();

    let table = parse_records("country\nJapan\nKENYA\nPeru\nNA\n", ".csv");
    let calls_before = oracle.call_count();
    let applied = tabulax
        .apply(&table, "country", &learned, &ApplyOptions::default())
        .unwrap();

    let provenances: Vec<&Value> = applied.records.iter().map(|r| &r["Provenance"]).collect();
    assert_eq!(
        provenances,
        vec![
            &json!("exact_match"),
            &json!("case_insensitive_match"),
            &json!("llm_generated"),
            &json!("empty_input"),
        ]
    );
    assert_eq!(applied.records[2]["Output"], json!("Lima"));
    assert_eq!(applied.records[0]["Relationship"], json!("country to capital"));
    assert_eq!(applied.report.provenance_counts[&Provenance::ExactMatch], 1);
    // Only the unseen value reaches the oracle
    assert_eq!(oracle.call_count() - calls_before, 1);
}

#[test]
fn test_lookup_without_examples_never_calls_oracle() {
    let oracle = Arc::new(MockOracle::new().with_default("should not be used"));
    let tabulax = Tabulax::from_arc(oracle.clone());
    let outcome = tabulax.transform_values(&[], &[], &[json!("x")]);

    assert_eq!(outcome.outputs, vec!["x"]);
    assert_eq!(outcome.provenances, vec![Provenance::NoExamplesProvided]);
    assert_eq!(outcome.relationship, "Unknown (no examples)");
    assert_eq!(oracle.call_count(), 0);
}

#[test]
fn test_classifier_outage_degrades_to_general() {
    let oracle = MockOracle::new()
        .failing_on("Classify the transformation")
        .with_rule("Name the relationship", "code to name");
    let tabulax = Tabulax::new(oracle);
    let learned = tabulax
        .learn(&ExampleSet::from_pairs([("US", "United States")]))
        .unwrap();
    assert_eq!(learned.category, TransformationCategory::General);
    assert!(matches!(
        learned.rule,
        Some(TransformationRule::LookupWithFallback(_))
    ));
}

// =============================================================================
// Fuzzy join
// =============================================================================

#[test]
fn test_join_files_and_write_outputs() {
    let dir = TempDir::new().unwrap();
    let source_path = dir.path().join("source.json");
    std::fs::write(
        &source_path,
        r#"[{"name":"Jon Smith","id":1},{"name":"Ana Lopez","id":2},{"name":"Zed","id":3}]"#,
    )
    .unwrap();
    let source = records_from_json_file(&source_path).unwrap();
    let target = parse_records("full_name,dept\nJohn Smith,Sales\nAnna Lopez,Ops\n", ".csv");

    let tabulax = Tabulax::new(MockOracle::new());
    let output = tabulax
        .fuzzy_join(
            &source,
            &target,
            "name",
            "full_name",
            TransformationCategory::StringBased,
            None,
        )
        .unwrap();
    assert_eq!(output.records.len(), 3);
    assert_eq!(output.matched_count(), 2);

    let flat = output.flatten();
    assert_eq!(flat[0]["target_dept"], json!("Sales"));
    assert_eq!(flat[0]["join_distance"], json!(1));
    assert_eq!(flat[2]["target_dept"], Value::Null);

    let mut csv = Vec::new();
    write_delimited(&flat, &mut csv, b',').unwrap();
    let csv = String::from_utf8(csv).unwrap();
    assert!(csv.starts_with("name,id,target_full_name,target_dept,join_distance\n"));
    assert!(csv.ends_with("Zed,3,,,inf\n"));

    let json_path = dir.path().join("joined.json");
    write_json(&flat, std::fs::File::create(&json_path).unwrap()).unwrap();
    let reread = records_from_json_file(&json_path).unwrap();
    assert_eq!(reread, flat);
}

#[test]
fn test_numeric_join_threshold() {
    let source = parse_records("price\n10.0\n20.5\n", ".csv");
    let target = parse_records("amount\n10.4\n22\n", ".csv");
    let tabulax = Tabulax::new(MockOracle::new());

    let output = tabulax
        .fuzzy_join(
            &source,
            &target,
            "price",
            "amount",
            TransformationCategory::Numerical,
            Some(0.5),
        )
        .unwrap();
    assert!(output.records[0].is_matched());
    assert!(!output.records[1].is_matched());
}
