//! Fuzz target for the table parser.
//!
//! The CSV/TSV parser must never panic on malformed input, and parsed
//! tables must convert to records and write back out.

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Write;
use tabulax::Parser;
use tabulax::input::write_delimited;

fuzz_target!(|data: &[u8]| {
    // Only process reasonable-sized inputs to avoid OOM
    if data.len() > 100_000 {
        return;
    }

    if let Ok(mut temp_file) = tempfile::NamedTempFile::new() {
        if temp_file.write_all(data).is_ok() {
            if let Ok(table) = Parser::new().parse_file(temp_file.path()) {
                let records = table.to_records();
                let _ = write_delimited(&records, std::io::sink(), table.delimiter);
            }
        }
    }
});
