//! Input parsing and the tabular record boundary.

mod parser;
mod records;
mod table;
mod writer;

pub use parser::{Parser, ParserConfig};
pub use records::{
    Record, cell_number, cell_text, column_names, column_values, has_column,
    records_from_json_file, records_from_json_str,
};
pub use table::DataTable;
pub use writer::{write_delimited, write_json};
