//! Fuzz target for oracle reply parsing.
//!
//! Replies are free text from a remote service; extraction helpers must
//! never panic on them.

#![no_main]

use libfuzzer_sys::fuzz_target;
use tabulax::oracle::reply::{extract_json_object, relationship_from_reply, strip_code_fences, unquote};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let stripped = strip_code_fences(text);
    let _ = extract_json_object(&stripped);
    let _ = relationship_from_reply(text);
    let _ = unquote(text);
});
