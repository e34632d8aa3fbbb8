//! Helpers for decoding free-text oracle replies.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;

use crate::error::OracleError;

static FENCE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*```[A-Za-z0-9_-]*\s*$").unwrap());

static RELATIONSHIP_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(?:\*\*)?relationship(?:\*\*)?\s*:\s*").unwrap());

/// Remove markdown code fences, keeping the fenced content.
pub fn strip_code_fences(reply: &str) -> String {
    FENCE_LINE.replace_all(reply, "").trim().to_string()
}

/// Extract the outermost `{ ... }` block from a reply, if any.
pub fn extract_json_object(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}

/// Parse a JSON value from a reply, tolerating fences and surrounding prose.
pub fn parse_json_reply<T: DeserializeOwned>(reply: &str) -> Result<T, OracleError> {
    let cleaned = strip_code_fences(reply);
    if let Ok(value) = serde_json::from_str(&cleaned) {
        return Ok(value);
    }
    let object = extract_json_object(&cleaned)
        .ok_or_else(|| OracleError::MalformedReply("no JSON object in reply".to_string()))?;
    serde_json::from_str(object).map_err(|e| OracleError::MalformedReply(e.to_string()))
}

/// Reduce a relationship reply to a single `X to Y` line.
///
/// Takes the last line mentioning " to " (case-insensitive) with any
/// `Relationship:` label removed; otherwise the trimmed reply.
pub fn relationship_from_reply(reply: &str) -> String {
    let cleaned = strip_code_fences(reply);
    let line = cleaned
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| line.to_lowercase().contains(" to "))
        .unwrap_or(cleaned.trim());
    RELATIONSHIP_LABEL.replace(line, "").trim().to_string()
}

/// Strip one layer of matching surrounding quotes.
pub fn unquote(text: &str) -> &str {
    let text = text.trim();
    for quote in ['"', '\'', '`'] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return text[1..text.len() - 1].trim();
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_strip_code_fences() {
        let reply = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(reply), "{\"a\": 1}");
        assert_eq!(strip_code_fences("  plain  "), "plain");
    }

    #[test]
    fn test_parse_json_reply_with_prose() {
        let reply = "Sure! Here it is:\n{\"category\": \"Numerical\"}\nHope that helps.";
        let value: Value = parse_json_reply(reply).unwrap();
        assert_eq!(value["category"], "Numerical");
    }

    #[test]
    fn test_parse_json_reply_rejects_text() {
        let result: Result<Value, _> = parse_json_reply("no json here");
        assert!(matches!(result, Err(OracleError::MalformedReply(_))));
    }

    #[test]
    fn test_relationship_takes_last_to_line() {
        let reply = "Looking at the data to decide.\nRelationship: email to domain";
        assert_eq!(relationship_from_reply(reply), "email to domain");
    }

    #[test]
    fn test_relationship_without_to_line() {
        assert_eq!(relationship_from_reply("  reverse string \n"), "reverse string");
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"Tokyo\""), "Tokyo");
        assert_eq!(unquote("'Paris'"), "Paris");
        assert_eq!(unquote("\"unbalanced"), "\"unbalanced");
        assert_eq!(unquote("\""), "\"");
    }
}
