//! Rule programs: the executable form of generated transformations.
//!
//! A program is a JSON list of steps over a closed vocabulary of text,
//! arithmetic, encoding, and date operations. Programs are validated when
//! compiled and run without I/O, unbounded loops, or host access. Every
//! intermediate value is bounded in length.

use std::fmt::Write as _;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::RuleError;
use crate::synthesis::numerical::format_number;

/// Character classes for `filter_chars`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharClass {
    Alphanumeric,
    Alphabetic,
    Numeric,
    WhitespaceFree,
}

impl CharClass {
    fn keeps(&self, c: char) -> bool {
        match self {
            CharClass::Alphanumeric => c.is_alphanumeric(),
            CharClass::Alphabetic => c.is_alphabetic(),
            CharClass::Numeric => c.is_numeric(),
            CharClass::WhitespaceFree => !c.is_whitespace(),
        }
    }
}

/// Operators for the `arithmetic` step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Mod,
}

fn default_fill() -> char {
    ' '
}

fn default_separator() -> String {
    " ".to_string()
}

fn default_base() -> u32 {
    10
}

/// One operation in a rule program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RuleStep {
    Trim,
    Lowercase,
    Uppercase,
    TitleCase,
    Capitalize,
    Reverse,
    Replace {
        from: String,
        #[serde(default)]
        to: String,
    },
    RegexReplace {
        pattern: String,
        #[serde(default)]
        replacement: String,
    },
    RegexExtract {
        pattern: String,
        #[serde(default)]
        group: usize,
    },
    RegexFormat {
        pattern: String,
        template: String,
    },
    SplitTake {
        separator: String,
        index: i64,
    },
    Slice {
        #[serde(default)]
        start: i64,
        #[serde(default)]
        end: Option<i64>,
    },
    Prefix {
        value: String,
    },
    Suffix {
        value: String,
    },
    PadLeft {
        width: usize,
        #[serde(default = "default_fill")]
        fill: char,
    },
    FilterChars {
        keep: CharClass,
    },
    TrimChars {
        chars: String,
    },
    Arithmetic {
        operation: ArithmeticOp,
        operand: f64,
    },
    Round {
        #[serde(default)]
        digits: u32,
    },
    ToRadix {
        base: u32,
    },
    FromRadix {
        base: u32,
    },
    Base64Encode,
    Base64Decode,
    HexEncode,
    HexDecode,
    Sha256,
    CharCodes {
        #[serde(default = "default_separator")]
        separator: String,
        #[serde(default = "default_base")]
        base: u32,
    },
    Caesar {
        shift: i32,
    },
    DateFormat {
        input_format: String,
        output_format: String,
    },
    DateToTimestamp {
        input_format: String,
    },
    TimestampToDate {
        output_format: String,
    },
}

impl RuleStep {
    /// The `op` name of this step.
    pub fn name(&self) -> &'static str {
        match self {
            RuleStep::Trim => "trim",
            RuleStep::Lowercase => "lowercase",
            RuleStep::Uppercase => "uppercase",
            RuleStep::TitleCase => "title_case",
            RuleStep::Capitalize => "capitalize",
            RuleStep::Reverse => "reverse",
            RuleStep::Replace { .. } => "replace",
            RuleStep::RegexReplace { .. } => "regex_replace",
            RuleStep::RegexExtract { .. } => "regex_extract",
            RuleStep::RegexFormat { .. } => "regex_format",
            RuleStep::SplitTake { .. } => "split_take",
            RuleStep::Slice { .. } => "slice",
            RuleStep::Prefix { .. } => "prefix",
            RuleStep::Suffix { .. } => "suffix",
            RuleStep::PadLeft { .. } => "pad_left",
            RuleStep::FilterChars { .. } => "filter_chars",
            RuleStep::TrimChars { .. } => "trim_chars",
            RuleStep::Arithmetic { .. } => "arithmetic",
            RuleStep::Round { .. } => "round",
            RuleStep::ToRadix { .. } => "to_radix",
            RuleStep::FromRadix { .. } => "from_radix",
            RuleStep::Base64Encode => "base64_encode",
            RuleStep::Base64Decode => "base64_decode",
            RuleStep::HexEncode => "hex_encode",
            RuleStep::HexDecode => "hex_decode",
            RuleStep::Sha256 => "sha256",
            RuleStep::CharCodes { .. } => "char_codes",
            RuleStep::Caesar { .. } => "caesar",
            RuleStep::DateFormat { .. } => "date_format",
            RuleStep::DateToTimestamp { .. } => "date_to_timestamp",
            RuleStep::TimestampToDate { .. } => "timestamp_to_date",
        }
    }
}

/// A rule program as emitted by the oracle: `{"transform": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleProgram {
    #[serde(rename = "transform")]
    pub steps: Vec<RuleStep>,
}

impl RuleProgram {
    pub fn new(steps: Vec<RuleStep>) -> Self {
        Self { steps }
    }

    /// Validate and compile with the given limits.
    pub fn compile(&self, limits: &ProgramLimits) -> Result<CompiledProgram, RuleError> {
        CompiledProgram::compile(self, limits)
    }
}

/// Resource bounds for compiling and running programs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramLimits {
    /// Maximum number of steps.
    pub max_steps: usize,
    /// Maximum byte length of the input and of every intermediate value.
    pub max_value_len: usize,
    /// Compiled size limit for each regex.
    pub regex_size_limit: usize,
    /// Largest allowed `pow` exponent magnitude.
    pub max_exponent: f64,
}

impl Default for ProgramLimits {
    fn default() -> Self {
        Self {
            max_steps: 32,
            max_value_len: 10_000,
            regex_size_limit: 1 << 20,
            max_exponent: 64.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Filter {
    Upper,
    Lower,
    Title,
    First,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TemplatePart {
    Literal(String),
    Group { index: usize, filter: Option<Filter> },
}

#[derive(Debug, Clone)]
struct CompiledStep {
    step: RuleStep,
    regex: Option<Regex>,
    template: Vec<TemplatePart>,
}

/// A validated program, ready to run.
#[derive(Debug, Clone)]
pub struct CompiledProgram {
    steps: Vec<CompiledStep>,
    max_value_len: usize,
}

impl CompiledProgram {
    /// Validate every step and precompile its regex and template.
    pub fn compile(program: &RuleProgram, limits: &ProgramLimits) -> Result<Self, RuleError> {
        if program.steps.len() > limits.max_steps {
            return Err(RuleError::TooManySteps {
                count: program.steps.len(),
                limit: limits.max_steps,
            });
        }

        let steps = program
            .steps
            .iter()
            .enumerate()
            .map(|(i, step)| compile_step(i + 1, step, limits))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            steps,
            max_value_len: limits.max_value_len,
        })
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the program has no steps (identity).
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run on one value. Blank input yields empty output.
    pub fn run(&self, input: &str) -> Result<String, RuleError> {
        if input.trim().is_empty() {
            return Ok(String::new());
        }
        if input.len() > self.max_value_len {
            return Err(RuleError::ValueTooLong {
                step: 0,
                limit: self.max_value_len,
            });
        }

        let mut value = input.to_string();
        for (i, compiled) in self.steps.iter().enumerate() {
            let step = i + 1;
            value = run_step(step, compiled, value, self.max_value_len)?;
            if value.len() > self.max_value_len {
                return Err(RuleError::ValueTooLong {
                    step,
                    limit: self.max_value_len,
                });
            }
        }
        Ok(value)
    }
}

fn invalid(step: usize, rule: &RuleStep, message: impl Into<String>) -> RuleError {
    RuleError::InvalidStep {
        step,
        op: rule.name(),
        message: message.into(),
    }
}

fn failed(step: usize, rule: &RuleStep, message: impl Into<String>) -> RuleError {
    RuleError::StepFailed {
        step,
        op: rule.name(),
        message: message.into(),
    }
}

fn compile_step(
    index: usize,
    step: &RuleStep,
    limits: &ProgramLimits,
) -> Result<CompiledStep, RuleError> {
    if text_params(step)
        .iter()
        .any(|param| param.len() > limits.max_value_len)
    {
        return Err(invalid(index, step, "parameter exceeds the value length limit"));
    }

    let build_regex = |pattern: &str| {
        RegexBuilder::new(pattern)
            .size_limit(limits.regex_size_limit)
            .dfa_size_limit(limits.regex_size_limit)
            .build()
            .map_err(|e| invalid(index, step, e.to_string()))
    };

    let mut regex = None;
    let mut template = Vec::new();

    match step {
        RuleStep::Replace { from, .. } if from.is_empty() => {
            return Err(invalid(index, step, "'from' must not be empty"));
        }
        RuleStep::RegexReplace { pattern, .. } => {
            regex = Some(build_regex(pattern)?);
        }
        RuleStep::RegexExtract { pattern, group } => {
            let re = build_regex(pattern)?;
            if *group >= re.captures_len() {
                return Err(invalid(index, step, format!("no capture group {}", group)));
            }
            regex = Some(re);
        }
        RuleStep::RegexFormat { pattern, template: text } => {
            let re = build_regex(pattern)?;
            template = parse_template(text).map_err(|m| invalid(index, step, m))?;
            for part in &template {
                if let TemplatePart::Group { index: g, .. } = part {
                    if *g >= re.captures_len() {
                        return Err(invalid(index, step, format!("no capture group {}", g)));
                    }
                }
            }
            regex = Some(re);
        }
        RuleStep::SplitTake { separator, .. } if separator.is_empty() => {
            return Err(invalid(index, step, "separator must not be empty"));
        }
        RuleStep::PadLeft { width, .. } if *width > limits.max_value_len => {
            return Err(invalid(index, step, "width exceeds the value length limit"));
        }
        RuleStep::Arithmetic { operation, operand } => {
            if !operand.is_finite() {
                return Err(invalid(index, step, "operand must be finite"));
            }
            match operation {
                ArithmeticOp::Div | ArithmeticOp::Mod if *operand == 0.0 => {
                    return Err(invalid(index, step, "division by zero"));
                }
                ArithmeticOp::Pow if operand.abs() > limits.max_exponent => {
                    return Err(invalid(index, step, "exponent too large"));
                }
                _ => {}
            }
        }
        RuleStep::Round { digits } if *digits > 15 => {
            return Err(invalid(index, step, "at most 15 digits"));
        }
        RuleStep::ToRadix { base } | RuleStep::FromRadix { base } if !(2..=36).contains(base) => {
            return Err(invalid(index, step, "base must be between 2 and 36"));
        }
        RuleStep::CharCodes { base, .. } if ![2, 8, 10, 16].contains(base) => {
            return Err(invalid(index, step, "base must be 2, 8, 10, or 16"));
        }
        RuleStep::DateFormat {
            input_format,
            output_format,
        } => {
            check_date_format(input_format).map_err(|m| invalid(index, step, m))?;
            check_date_format(output_format).map_err(|m| invalid(index, step, m))?;
        }
        RuleStep::DateToTimestamp { input_format } => {
            check_date_format(input_format).map_err(|m| invalid(index, step, m))?;
        }
        RuleStep::TimestampToDate { output_format } => {
            check_date_format(output_format).map_err(|m| invalid(index, step, m))?;
        }
        _ => {}
    }

    Ok(CompiledStep {
        step: step.clone(),
        regex,
        template,
    })
}

/// Free-text parameters of a step.
fn text_params(step: &RuleStep) -> Vec<&str> {
    match step {
        RuleStep::Replace { from, to } => vec![from.as_str(), to.as_str()],
        RuleStep::RegexReplace {
            pattern,
            replacement,
        } => vec![pattern.as_str(), replacement.as_str()],
        RuleStep::RegexExtract { pattern, .. } => vec![pattern.as_str()],
        RuleStep::RegexFormat { pattern, template } => vec![pattern.as_str(), template.as_str()],
        RuleStep::SplitTake { separator, .. } => vec![separator.as_str()],
        RuleStep::Prefix { value } | RuleStep::Suffix { value } => vec![value.as_str()],
        RuleStep::TrimChars { chars } => vec![chars.as_str()],
        RuleStep::CharCodes { separator, .. } => vec![separator.as_str()],
        RuleStep::DateFormat {
            input_format,
            output_format,
        } => vec![input_format.as_str(), output_format.as_str()],
        RuleStep::DateToTimestamp { input_format } => vec![input_format.as_str()],
        RuleStep::TimestampToDate { output_format } => vec![output_format.as_str()],
        _ => Vec::new(),
    }
}

fn too_long(step: usize, limit: usize) -> RuleError {
    RuleError::ValueTooLong { step, limit }
}

fn check_date_format(format: &str) -> Result<(), String> {
    if format.is_empty() {
        return Err("date format must not be empty".to_string());
    }
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(format!("invalid date format '{}'", format));
    }
    Ok(())
}

/// Parse `{n}` / `{n|filter}` templates with `{{` and `}}` escapes.
fn parse_template(text: &str) -> Result<Vec<TemplatePart>, String> {
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                literal.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                literal.push('}');
            }
            '{' => {
                let mut inner = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(ch) => inner.push(ch),
                        None => return Err("unclosed '{' in template".to_string()),
                    }
                }
                if !literal.is_empty() {
                    parts.push(TemplatePart::Literal(std::mem::take(&mut literal)));
                }
                parts.push(parse_placeholder(&inner)?);
            }
            '}' => return Err("unmatched '}' in template".to_string()),
            other => literal.push(other),
        }
    }
    if !literal.is_empty() {
        parts.push(TemplatePart::Literal(literal));
    }
    Ok(parts)
}

fn parse_placeholder(inner: &str) -> Result<TemplatePart, String> {
    let (index, filter) = match inner.split_once('|') {
        Some((index, filter)) => (index, Some(filter.trim())),
        None => (inner, None),
    };
    let index = index
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("invalid group reference '{{{}}}'", inner))?;
    let filter = match filter {
        None => None,
        Some("upper") => Some(Filter::Upper),
        Some("lower") => Some(Filter::Lower),
        Some("title") => Some(Filter::Title),
        Some("first") => Some(Filter::First),
        Some(other) => return Err(format!("unknown filter '{}'", other)),
    };
    Ok(TemplatePart::Group { index, filter })
}

fn run_step(
    index: usize,
    compiled: &CompiledStep,
    value: String,
    limit: usize,
) -> Result<String, RuleError> {
    let step = &compiled.step;
    let out = match step {
        RuleStep::Trim => value.trim().to_string(),
        RuleStep::Lowercase => value.to_lowercase(),
        RuleStep::Uppercase => value.to_uppercase(),
        RuleStep::TitleCase => title_case(&value),
        RuleStep::Capitalize => capitalize(&value),
        RuleStep::Reverse => value.chars().rev().collect(),
        RuleStep::Replace { from, to } => {
            // Matches never overlap, so this is the exact output length
            let hits = value.matches(from.as_str()).count();
            if value.len() - hits * from.len() + hits * to.len() > limit {
                return Err(too_long(index, limit));
            }
            value.replace(from.as_str(), to)
        }
        RuleStep::RegexReplace { replacement, .. } => {
            let re = compiled_regex(index, compiled)?;
            let mut out = String::new();
            let mut last = 0;
            for caps in re.captures_iter(&value) {
                let Some(whole) = caps.get(0) else { continue };
                out.push_str(&value[last..whole.start()]);
                caps.expand(replacement, &mut out);
                last = whole.end();
                if out.len() > limit {
                    return Err(too_long(index, limit));
                }
            }
            out.push_str(&value[last..]);
            out
        }
        RuleStep::RegexExtract { group, .. } => {
            let re = compiled_regex(index, compiled)?;
            re.captures(&value)
                .and_then(|caps| caps.get(*group))
                .map(|m| m.as_str().to_string())
                .ok_or_else(|| failed(index, step, "pattern did not match"))?
        }
        RuleStep::RegexFormat { .. } => {
            let re = compiled_regex(index, compiled)?;
            let caps = re
                .captures(&value)
                .ok_or_else(|| failed(index, step, "pattern did not match"))?;
            render_template(&compiled.template, &caps, limit)
                .ok_or_else(|| too_long(index, limit))?
        }
        RuleStep::SplitTake { separator, index: at } => {
            let parts: Vec<&str> = value.split(separator.as_str()).collect();
            resolve_index(*at, parts.len())
                .map(|i| parts[i].to_string())
                .ok_or_else(|| failed(index, step, format!("no part {}", at)))?
        }
        RuleStep::Slice { start, end } => {
            let chars: Vec<char> = value.chars().collect();
            let len = chars.len() as i64;
            let clamp = |i: i64| if i < 0 { (len + i).max(0) } else { i.min(len) };
            let from = clamp(*start);
            let to = clamp(end.unwrap_or(len));
            if from >= to {
                String::new()
            } else {
                chars[from as usize..to as usize].iter().collect()
            }
        }
        RuleStep::Prefix { value: prefix } => format!("{}{}", prefix, value),
        RuleStep::Suffix { value: suffix } => format!("{}{}", value, suffix),
        RuleStep::PadLeft { width, fill } => {
            let len = value.chars().count();
            if len >= *width {
                value
            } else {
                let mut padded: String = std::iter::repeat_n(*fill, width - len).collect();
                padded.push_str(&value);
                padded
            }
        }
        RuleStep::FilterChars { keep } => value.chars().filter(|c| keep.keeps(*c)).collect(),
        RuleStep::TrimChars { chars } => value.trim_matches(|c| chars.contains(c)).to_string(),
        RuleStep::Arithmetic { operation, operand } => {
            let x = parse_float(index, step, &value)?;
            let y = match operation {
                ArithmeticOp::Add => x + operand,
                ArithmeticOp::Sub => x - operand,
                ArithmeticOp::Mul => x * operand,
                ArithmeticOp::Div => x / operand,
                ArithmeticOp::Pow => x.powf(*operand),
                ArithmeticOp::Mod => x - operand * (x / operand).floor(),
            };
            if !y.is_finite() {
                return Err(failed(index, step, "result is not finite"));
            }
            format_number(y)
        }
        RuleStep::Round { digits } => {
            let x = parse_float(index, step, &value)?;
            let rounded = format!("{:.*}", *digits as usize, x);
            match rounded.strip_prefix('-') {
                Some(rest) if rest.chars().all(|c| c == '0' || c == '.') => rest.to_string(),
                _ => rounded,
            }
        }
        RuleStep::ToRadix { base } => {
            let n = parse_integer(index, step, &value)?;
            to_radix(n, *base)
        }
        RuleStep::FromRadix { base } => {
            let digits = strip_radix_prefix(value.trim(), *base);
            i64::from_str_radix(digits, *base)
                .map_err(|e| failed(index, step, e.to_string()))?
                .to_string()
        }
        RuleStep::Base64Encode => BASE64.encode(value.as_bytes()),
        RuleStep::Base64Decode => {
            let bytes = BASE64
                .decode(value.trim())
                .map_err(|e| failed(index, step, e.to_string()))?;
            String::from_utf8(bytes).map_err(|e| failed(index, step, e.to_string()))?
        }
        RuleStep::HexEncode => hex::encode(value.as_bytes()),
        RuleStep::HexDecode => {
            let bytes = hex::decode(value.trim()).map_err(|e| failed(index, step, e.to_string()))?;
            String::from_utf8(bytes).map_err(|e| failed(index, step, e.to_string()))?
        }
        RuleStep::Sha256 => hex::encode(Sha256::digest(value.as_bytes())),
        RuleStep::CharCodes { separator, base } => {
            let mut out = String::new();
            for (i, c) in value.chars().enumerate() {
                if i > 0 {
                    out.push_str(separator);
                }
                let code = c as u32;
                let written = match base {
                    2 => write!(out, "{:08b}", code),
                    8 => write!(out, "{:o}", code),
                    16 => write!(out, "{:X}", code),
                    _ => write!(out, "{}", code),
                };
                written.map_err(|_| failed(index, step, "cannot format code"))?;
                if out.len() > limit {
                    return Err(too_long(index, limit));
                }
            }
            out
        }
        RuleStep::Caesar { shift } => caesar(&value, *shift),
        RuleStep::DateFormat {
            input_format,
            output_format,
        } => {
            let dt = parse_datetime(value.trim(), input_format)
                .ok_or_else(|| failed(index, step, "value does not match input format"))?;
            let mut out = String::new();
            write!(out, "{}", dt.format(output_format))
                .map_err(|_| failed(index, step, "output format not applicable"))?;
            out
        }
        RuleStep::DateToTimestamp { input_format } => {
            let dt = parse_datetime(value.trim(), input_format)
                .ok_or_else(|| failed(index, step, "value does not match input format"))?;
            dt.and_utc().timestamp().to_string()
        }
        RuleStep::TimestampToDate { output_format } => {
            let secs = parse_integer(index, step, &value)?;
            let dt = DateTime::from_timestamp(secs, 0)
                .ok_or_else(|| failed(index, step, "timestamp out of range"))?;
            let mut out = String::new();
            write!(out, "{}", dt.naive_utc().format(output_format))
                .map_err(|_| failed(index, step, "output format not applicable"))?;
            out
        }
    };
    Ok(out)
}

fn compiled_regex(index: usize, compiled: &CompiledStep) -> Result<&Regex, RuleError> {
    compiled
        .regex
        .as_ref()
        .ok_or_else(|| failed(index, &compiled.step, "regex not compiled"))
}

/// Render a template, or `None` once the output passes `limit` bytes.
fn render_template(
    template: &[TemplatePart],
    caps: &regex::Captures<'_>,
    limit: usize,
) -> Option<String> {
    let mut out = String::new();
    for part in template {
        match part {
            TemplatePart::Literal(text) => out.push_str(text),
            TemplatePart::Group { index, filter } => {
                let text = caps.get(*index).map(|m| m.as_str()).unwrap_or("");
                match filter {
                    None => out.push_str(text),
                    Some(Filter::Upper) => out.push_str(&text.to_uppercase()),
                    Some(Filter::Lower) => out.push_str(&text.to_lowercase()),
                    Some(Filter::Title) => out.push_str(&title_case(text)),
                    Some(Filter::First) => out.extend(text.chars().next()),
                }
            }
        }
        if out.len() > limit {
            return None;
        }
    }
    Some(out)
}

/// Python-style index resolution: negatives count from the end.
fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let resolved = if index < 0 { len + index } else { index };
    (0..len).contains(&resolved).then_some(resolved as usize)
}

/// Uppercase the first letter of every run of letters, lowercase the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.as_str().to_lowercase().chars())
            .collect(),
        None => String::new(),
    }
}

fn caesar(text: &str, shift: i32) -> String {
    let shift = shift.rem_euclid(26) as u8;
    text.chars()
        .map(|c| match c {
            'a'..='z' => (((c as u8 - b'a' + shift) % 26) + b'a') as char,
            'A'..='Z' => (((c as u8 - b'A' + shift) % 26) + b'A') as char,
            other => other,
        })
        .collect()
}

fn parse_float(index: usize, step: &RuleStep, value: &str) -> Result<f64, RuleError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| failed(index, step, format!("'{}' is not a number", value)))
}

fn parse_integer(index: usize, step: &RuleStep, value: &str) -> Result<i64, RuleError> {
    let trimmed = value.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Ok(n);
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 9.0e18 => Ok(v as i64),
        _ => Err(failed(index, step, format!("'{}' is not an integer", value))),
    }
}

fn to_radix(n: i64, base: u32) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut magnitude = n.unsigned_abs();
    let mut digits = Vec::new();
    while magnitude > 0 {
        let d = (magnitude % base as u64) as u32;
        digits.push(std::char::from_digit(d, base).unwrap_or('?'));
        magnitude /= base as u64;
    }
    if n < 0 {
        digits.push('-');
    }
    digits.iter().rev().collect()
}

fn strip_radix_prefix(text: &str, base: u32) -> &str {
    let prefix = match base {
        2 => ["0b", "0B"],
        8 => ["0o", "0O"],
        16 => ["0x", "0X"],
        _ => return text,
    };
    prefix
        .iter()
        .find_map(|p| text.strip_prefix(p))
        .unwrap_or(text)
}

fn parse_datetime(text: &str, format: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, format)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, format)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
