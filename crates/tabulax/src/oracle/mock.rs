//! Mock oracle for testing and offline use.

use std::sync::Mutex;

use crate::error::OracleError;

use super::provider::SemanticOracle;

/// Scripted oracle with deterministic replies.
///
/// Rules are checked in insertion order; the first whose pattern occurs in
/// the prompt answers. Failure patterns are checked before rules.
pub struct MockOracle {
    rules: Vec<(String, String)>,
    failures: Vec<String>,
    default_reply: String,
    prompts: Mutex<Vec<String>>,
}

impl MockOracle {
    /// Create a mock that answers every prompt with an empty reply.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            failures: Vec::new(),
            default_reply: String::new(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Answer prompts containing `pattern` with `reply`.
    pub fn with_rule(mut self, pattern: impl Into<String>, reply: impl Into<String>) -> Self {
        self.rules.push((pattern.into(), reply.into()));
        self
    }

    /// Reply used when no rule matches.
    pub fn with_default(mut self, reply: impl Into<String>) -> Self {
        self.default_reply = reply.into();
        self
    }

    /// Fail every prompt containing `pattern`.
    pub fn failing_on(mut self, pattern: impl Into<String>) -> Self {
        self.failures.push(pattern.into());
        self
    }

    /// Prompts received so far, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// Number of calls received so far.
    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }
}

impl Default for MockOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl SemanticOracle for MockOracle {
    fn invoke(&self, prompt: &str) -> Result<String, OracleError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        if self.failures.iter().any(|f| prompt.contains(f.as_str())) {
            return Err(OracleError::Transport("mock failure".to_string()));
        }

        let reply = self
            .rules
            .iter()
            .find(|(pattern, _)| prompt.contains(pattern.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| self.default_reply.clone());
        Ok(reply)
    }

    fn name(&self) -> &str {
        "mock"
    }
}
