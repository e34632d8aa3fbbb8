//! OpenAI Chat Completions oracle.

use reqwest::blocking::Client;
use serde_json::{Value, json};

use crate::error::{OracleError, Result};

use super::config::OracleConfig;
use super::http;
use super::prompts;
use super::provider::SemanticOracle;

/// OpenAI API base.
const API_BASE: &str = "https://api.openai.com";

/// OpenAI (and compatible) chat oracle.
pub struct OpenAIOracle {
    client: Client,
    api_key: String,
    config: OracleConfig,
}

impl OpenAIOracle {
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
        format!("{}/v1/chat/completions", base)
    }
}

impl SemanticOracle for OpenAIOracle {
    fn invoke(&self, prompt: &str) -> std::result::Result<String, OracleError> {
        let body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "messages": [
                { "role": "system", "content": prompts::system_prompt() },
                { "role": "user", "content": prompt }
            ]
        });

        let bearer = format!("Bearer {}", self.api_key);
        let headers = http::json_headers(&[("authorization", bearer.as_str())])
            .map_err(|e| OracleError::Transport(e.to_string()))?;
        let reply = http::post_json(
            &self.client,
            &self.endpoint(),
            headers,
            &body,
            self.config.timeout,
        )?;

        let text = reply
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_string);
        http::non_empty(text)
    }

    fn name(&self) -> &str {
        "openai"
    }
}
