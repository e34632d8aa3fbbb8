//! Parsed delimited tables.

use serde_json::Value;

use super::records::Record;

/// Represents parsed tabular data.
#[derive(Debug, Clone)]
pub struct DataTable {
    /// Column headers.
    pub headers: Vec<String>,
    /// Row data as strings (row-major order).
    pub rows: Vec<Vec<String>>,
    /// The delimiter used.
    pub delimiter: u8,
}

impl DataTable {
    /// Create a new data table.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>, delimiter: u8) -> Self {
        Self {
            headers,
            rows,
            delimiter,
        }
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Get the number of rows (excluding header).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the index of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Get all values for a column by index.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .map(move |row| row.get(index).map(|s| s.as_str()).unwrap_or(""))
    }

    /// Get a column by name.
    pub fn column_by_name(&self, name: &str) -> Option<Vec<&str>> {
        let index = self.column_index(name)?;
        Some(self.column_values(index).collect())
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(col).map(|s| s.as_str()))
    }

    /// Check if a value represents a missing/null value.
    pub fn is_null_value(value: &str) -> bool {
        let trimmed = value.trim();
        trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case("na")
            || trimmed.eq_ignore_ascii_case("n/a")
            || trimmed.eq_ignore_ascii_case("nan")
            || trimmed.eq_ignore_ascii_case("null")
            || trimmed.eq_ignore_ascii_case("none")
            || trimmed.eq_ignore_ascii_case("nil")
            || trimmed == "."
            || trimmed == "-"
    }

    /// Convert to uniform records, mapping null-like cells to `Value::Null`.
    pub fn to_records(&self) -> Vec<Record> {
        self.rows
            .iter()
            .map(|row| {
                self.headers
                    .iter()
                    .enumerate()
                    .map(|(i, header)| {
                        let cell = row.get(i).map(|s| s.as_str()).unwrap_or("");
                        let value = if Self::is_null_value(cell) {
                            Value::Null
                        } else {
                            Value::String(cell.to_string())
                        };
                        (header.clone(), value)
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_null_value() {
        assert!(DataTable::is_null_value(""));
        assert!(DataTable::is_null_value("NA"));
        assert!(DataTable::is_null_value("na"));
        assert!(DataTable::is_null_value("N/A"));
        assert!(DataTable::is_null_value("null"));
        assert!(DataTable::is_null_value("NaN"));
        assert!(DataTable::is_null_value("."));
        assert!(!DataTable::is_null_value("value"));
        assert!(!DataTable::is_null_value("0"));
    }

    #[test]
    fn test_to_records_preserves_column_order() {
        let table = DataTable::new(
            vec!["name".into(), "code".into()],
            vec![
                vec!["Tokyo".into(), "JP".into()],
                vec!["Lima".into(), "NA".into()],
            ],
            b',',
        );
        let records = table.to_records();

        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].keys().collect::<Vec<_>>(),
            vec!["name", "code"]
        );
        assert_eq!(records[1]["code"], Value::Null);
    }
}
