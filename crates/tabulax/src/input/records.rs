//! Uniform record representation at the tabular boundary.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;

use crate::error::{Result, TabulaxError};

/// One row: column name → cell value, in column order.
pub type Record = IndexMap<String, Value>;

/// Text of a scalar cell, or `None` for null and composite values.
pub fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Array(_) | Value::Object(_) => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
    }
}

/// Parse a number from a numeric cell or a numeric string.
pub fn cell_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

/// Union of column names across records, in first-seen order.
pub fn column_names(records: &[Record]) -> Vec<String> {
    let mut columns: IndexSet<&str> = IndexSet::new();
    for record in records {
        columns.extend(record.keys().map(String::as_str));
    }
    columns.into_iter().map(str::to_string).collect()
}

/// Whether any record carries the given column.
pub fn has_column(records: &[Record], column: &str) -> bool {
    records.iter().any(|r| r.contains_key(column))
}

/// Values of one column; rows lacking it yield `Value::Null`.
pub fn column_values(records: &[Record], column: &str) -> Vec<Value> {
    records
        .iter()
        .map(|r| r.get(column).cloned().unwrap_or(Value::Null))
        .collect()
}

/// Parse a JSON array of objects into records.
pub fn records_from_json_str(json: &str) -> Result<Vec<Record>> {
    let records: Vec<Record> = serde_json::from_str(json)?;
    Ok(records)
}

/// Load a JSON array of objects from a file.
pub fn records_from_json_file(path: impl AsRef<Path>) -> Result<Vec<Record>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| TabulaxError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let records: Vec<Record> = serde_json::from_reader(BufReader::new(file))?;
    if records.is_empty() {
        return Err(TabulaxError::EmptyData(format!(
            "No records in '{}'",
            path.display()
        )));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&json!("abc")), Some("abc".to_string()));
        assert_eq!(cell_text(&json!(42)), Some("42".to_string()));
        assert_eq!(cell_text(&json!(true)), Some("true".to_string()));
        assert_eq!(cell_text(&Value::Null), None);
        assert_eq!(cell_text(&json!([1, 2])), None);
    }

    #[test]
    fn test_cell_number() {
        assert_eq!(cell_number(&json!(2.5)), Some(2.5));
        assert_eq!(cell_number(&json!(" 10 ")), Some(10.0));
        assert_eq!(cell_number(&json!("ten")), None);
        assert_eq!(cell_number(&json!("inf")), None);
        assert_eq!(cell_number(&Value::Null), None);
    }

    #[test]
    fn test_column_names_union() {
        let records = records_from_json_str(r#"[{"a":1,"b":2},{"b":3,"c":4}]"#).unwrap();
        assert_eq!(column_names(&records), vec!["a", "b", "c"]);
        assert!(has_column(&records, "c"));
        assert_eq!(column_values(&records, "c"), vec![Value::Null, json!(4)]);
    }
}
