//! Google Gemini oracle.

use reqwest::blocking::Client;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{OracleError, Result};

use super::config::OracleConfig;
use super::http;
use super::prompts;
use super::provider::SemanticOracle;

/// Gemini API base.
const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini `generateContent` oracle.
pub struct GeminiOracle {
    client: Client,
    api_key: String,
    config: OracleConfig,
}

impl GeminiOracle {
    /// Create from configuration; fails if no API key is set.
    pub fn new(config: OracleConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();
        let client = http::build_client(config.timeout)?;
        Ok(Self {
            client,
            api_key,
            config,
        })
    }

    fn endpoint(&self) -> String {
        let base = self
            .config
            .base_url
            .as_deref()
            .unwrap_or(API_BASE)
            .trim_end_matches('/');
        format!("{}/{}:generateContent", base, self.config.model)
    }
}

impl SemanticOracle for GeminiOracle {
    fn invoke(&self, prompt: &str) -> std::result::Result<String, OracleError> {
        let body = json!({
            "systemInstruction": { "parts": [{ "text": prompts::system_prompt() }] },
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": self.config.temperature,
                "maxOutputTokens": self.config.max_tokens
            }
        });

        let headers = http::json_headers(&[("x-goog-api-key", self.api_key.as_str())])
            .map_err(|e| OracleError::Transport(e.to_string()))?;
        let reply = http::post_json(
            &self.client,
            &self.endpoint(),
            headers,
            &body,
            self.config.timeout,
        )?;
        debug!(model = %self.config.model, "gemini reply received");
        http::non_empty(reply_text(&reply))
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// Concatenate the text parts of the first candidate.
fn reply_text(reply: &Value) -> Option<String> {
    let parts = reply
        .pointer("/candidates/0/content/parts")?
        .as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();
    Some(text)
}
