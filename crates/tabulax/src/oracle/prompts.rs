//! Prompt templates for oracle interactions.

use crate::model::ExamplePair;

/// System prompt shared by every provider.
pub fn system_prompt() -> &'static str {
    "You are a data transformation assistant. You study paired source and target \
     values from tabular data and describe, classify, or reproduce the transformation \
     between them. Answer exactly in the format requested, with no commentary."
}

/// Serialize pairs as `("s" -> "t"), ("s" -> "t")`.
pub fn serialize_pairs(pairs: &[ExamplePair]) -> String {
    pairs
        .iter()
        .map(|p| format!("({})", p.quoted()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Serialize pairs as `Input:` / `Expected output:` blocks.
fn test_cases(pairs: &[ExamplePair]) -> String {
    pairs
        .iter()
        .map(|p| format!("Input: {}\nExpected output: {}", p.source, p.target))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Build the category classification prompt.
pub fn classification_prompt(pairs: &[ExamplePair]) -> String {
    format!(
        r#"Classify the transformation type between source and target values.

## Categories
1. String-based: string manipulation such as splitting, case conversion, abbreviation.
   Examples: full names to initials, email usernames, phone number formatting.
2. Numerical: a mathematical function of the value.
   Examples: unit conversions, scaling, currency conversion, arithmetic.
3. Algorithmic: a specific algorithm that needs no outside knowledge.
   Examples: date format changes, hashing, encoding/decoding, character codes.
4. General: needs external knowledge or an arbitrary mapping.
   Examples: companies to CEOs, countries to capitals, airport codes to cities.

## Labelled examples
("john smith" -> "J. Smith") => String-based
("hello world" -> "Hello World") => String-based
("data_science" -> "Data Science") => String-based
("ChatGPT" -> "CHATGPT") => String-based
("Pranav Kumar" -> "pranav.kumar") => String-based
("5" -> "25") => Numerical
("100" -> "10") => Numerical
("8" -> "2.828") => Numerical
("32" -> "0") => Numerical
("@" -> "64") => Algorithmic
("AB" -> "01000001 01000010") => Algorithmic
("hello" -> "ifmmp") => Algorithmic
("1234" -> "4321") => Algorithmic
("2025-05-03" -> "1746230400") => Algorithmic
("test" -> "dGVzdA==") => Algorithmic
("255" -> "11111111") => Algorithmic
("Einstein" -> "Scientist") => General
("Whale" -> "Mammal") => General
("Japan" -> "Tokyo") => General
("Tesla" -> "Elon Musk") => General
("USD" -> "United States Dollar") => General

## Examples to classify
{}

Respond with a JSON object:
{{"category": "String-based" | "Numerical" | "Algorithmic" | "General"}}"#,
        serialize_pairs(pairs)
    )
}

/// Build the prompt asking the oracle to name the relationship.
pub fn relationship_prompt(pairs: &[ExamplePair]) -> String {
    let data = serialize_pairs(pairs);
    format!(
        r#"Name the relationship between the source and target values below.
Format the answer as [type of source] to [type of target]. Only write the relationship.

Data: ("arash@gmail.com" -> "gmail.com"), ("adargah@ualberta.ca" -> "ualberta.ca")
Relationship: email to domain

Data: ("2024/09/05" -> "1403/06/16"), ("1886/06/27" -> "1265/04/06")
Relationship: Gregorian date to Jalali (Solar Hijri) date

Data: ("Einstein" -> "Scientist"), ("Japan" -> "Tokyo")
Relationship: person to profession

Data: {}
Relationship:"#,
        data
    )
}

/// Build the rule-program prompt for string-based transformations.
pub fn string_rule_prompt(pairs: &[ExamplePair]) -> String {
    format!(
        r#"Write a rule program that converts each source value into its target value.
Each transformation follows a consistent string pattern. Use only the text steps
where possible. The program must map empty input to empty output and must work for
values beyond the examples.

{}

## Examples
{}

Only output the JSON rule program."#,
        RULE_VOCABULARY,
        test_cases(pairs)
    )
}

/// Build the rule-program prompt for a named algorithmic relationship.
pub fn algorithmic_rule_prompt(relationship: &str, pairs: &[ExamplePair]) -> String {
    format!(
        r#"Write a rule program that performs this transformation: {}.
Keenly observe the examples. The program takes one text value and returns one text
value, maps empty input to empty output, and must not fail on malformed input where
a step can avoid it.

{}

## Examples
{}

Only output the JSON rule program."#,
        relationship,
        RULE_VOCABULARY,
        test_cases(pairs)
    )
}

/// Build the per-value prediction prompt for the lookup fallback.
pub fn prediction_prompt(relationship: &str, pairs: &[ExamplePair], input: &str) -> String {
    format!(
        r#"Examples of transformation ({}):
{}

New input: "{}"
Predict the target value. Only output the predicted target value.
If uncertain, output the original input "{}"."#,
        relationship,
        serialize_pairs(pairs),
        input,
        input
    )
}

/// Description of the rule-program step vocabulary.
pub const RULE_VOCABULARY: &str = r#"## Rule program format
Respond with {"transform": [step, ...]}. Steps run in order on the current value.
Each step is an object with an "op" field:
- {"op": "trim"} | {"op": "lowercase"} | {"op": "uppercase"} | {"op": "title_case"}
  | {"op": "capitalize"} | {"op": "reverse"}
- {"op": "replace", "from": "_", "to": " "}
- {"op": "regex_replace", "pattern": "\\s+", "replacement": "-"}  ($1 refers to groups)
- {"op": "regex_extract", "pattern": "@(.+)$", "group": 1}
- {"op": "regex_format", "pattern": "^(\\w+)\\s+(\\w+)$", "template": "{1|first}. {2|title}"}
  (filters: upper, lower, title, first; {{ and }} are literal braces)
- {"op": "split_take", "separator": "@", "index": -1}  (negative counts from the end)
- {"op": "slice", "start": 0, "end": 3}  (character positions, end optional, negatives allowed)
- {"op": "prefix", "value": "0x"} | {"op": "suffix", "value": "!"}
- {"op": "pad_left", "width": 8, "fill": "0"}
- {"op": "filter_chars", "keep": "alphanumeric" | "alphabetic" | "numeric" | "whitespace_free"}
- {"op": "trim_chars", "chars": ".!?"}
- {"op": "arithmetic", "operation": "add" | "sub" | "mul" | "div" | "pow" | "mod", "operand": 2}
- {"op": "round", "digits": 2}
- {"op": "to_radix", "base": 2} | {"op": "from_radix", "base": 16}
- {"op": "base64_encode"} | {"op": "base64_decode"} | {"op": "hex_encode"} | {"op": "hex_decode"}
- {"op": "sha256"}
- {"op": "char_codes", "separator": " ", "base": 10}  (base 2 pads to 8 digits, base 16 is uppercase)
- {"op": "caesar", "shift": 1}
- {"op": "date_format", "input_format": "%Y-%m-%d", "output_format": "%d/%m/%Y"}
- {"op": "date_to_timestamp", "input_format": "%Y-%m-%d"}
- {"op": "timestamp_to_date", "output_format": "%Y-%m-%d"}"#;
