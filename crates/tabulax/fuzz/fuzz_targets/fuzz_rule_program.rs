//! Fuzz target for the rule-program interpreter.
//!
//! Programs come from an untrusted service, so any JSON that deserializes and
//! validates must run on any input without panicking, and must respect the
//! configured value length bound.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tabulax::{ProgramLimits, RuleProgram};

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    program: &'a str,
    values: Vec<&'a str>,
}

fuzz_target!(|input: Input<'_>| {
    if input.program.len() > 4_096 || input.values.len() > 16 {
        return;
    }

    let Ok(program) = serde_json::from_str::<RuleProgram>(input.program) else {
        return;
    };
    let limits = ProgramLimits::default();
    let Ok(compiled) = program.compile(&limits) else {
        return;
    };

    for value in input.values {
        if let Ok(output) = compiled.run(value) {
            assert!(output.len() <= limits.max_value_len);
        }
    }
});
