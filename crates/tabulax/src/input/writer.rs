//! Serializing records back to delimited text or JSON.

use std::io::Write;

use serde_json::Value;

use super::records::{Record, column_names};
use crate::error::Result;

/// Write records as delimited text with a header row.
///
/// Columns are the union across records, in first-seen order. Nulls become
/// empty cells.
pub fn write_delimited<W: Write>(records: &[Record], writer: W, delimiter: u8) -> Result<()> {
    let columns = column_names(records);
    let mut out = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);

    out.write_record(&columns)?;
    for record in records {
        let row: Vec<String> = columns
            .iter()
            .map(|c| record.get(c).map(render_cell).unwrap_or_default())
            .collect();
        out.write_record(&row)?;
    }
    out.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write records as a pretty-printed JSON array.
pub fn write_json<W: Write>(records: &[Record], writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, records)?;
    Ok(())
}

fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
