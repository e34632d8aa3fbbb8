//! Anthropic Claude oracle.

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;

use crate::error::{OracleError, Result};

use super::config::OracleConfig;
use super::http;
use super::prompts;
use super::provider::SemanticOracle;

/// Anthropic API endpoint.
const API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Anthropic API version.
const API_VERSION: &str = "2023-06-01";

/// Anthropic Messages API oracle.
pub struct AnthropicOracle {
    client: Client,
    api_key: String,
    config: OracleConfig,
}

impl AnthropicOracle {
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
}

impl SemanticOracle for AnthropicOracle {
    fn invoke(&self, prompt: &str) -> std::result::Result<String, OracleError> {
        let body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "system": prompts::system_prompt(),
            "messages": [
                {
                    "role": "user",
                    "content": prompt
                }
            ]
        });

        let headers = http::json_headers(&[
            ("x-api-key", self.api_key.as_str()),
            ("anthropic-version", API_VERSION),
        ])
        .map_err(|e| OracleError::Transport(e.to_string()))?;
        let url = self.config.base_url.as_deref().unwrap_or(API_URL);
        let reply = http::post_json(&self.client, url, headers, &body, self.config.timeout)?;

        let api_response: ApiResponse = serde_json::from_value(reply)
            .map_err(|e| OracleError::MalformedReply(e.to_string()))?;

        // First text block wins
        let text = api_response
            .content
            .into_iter()
            .find_map(|block| (block.content_type == "text").then_some(block.text));
        http::non_empty(text)
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

/// API response structure.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TabulaxError;
    use crate::oracle::OracleProvider;

    #[test]
    fn test_requires_key() {
        let result = AnthropicOracle::new(OracleConfig::new(OracleProvider::Anthropic));
        assert!(matches!(
            result,
            Err(TabulaxError::MissingCredential { variable: "ANTHROPIC_API_KEY", .. })
        ));
    }

    #[test]
    fn test_response_decoding() {
        let reply: ApiResponse = serde_json::from_value(json!({
            "content": [{ "type": "tool_use" }, { "type": "text", "text": "String-based" }]
        }))
        .unwrap();
        assert_eq!(reply.content[1].text, "String-based");
    }
}
