//! Ollama local oracle.
//!
//! Ollama runs models locally without API keys. Install from: https://ollama.ai

use reqwest::blocking::Client;
use serde_json::{Value, json};

use crate::error::{OracleError, Result};

use super::config::OracleConfig;
use super::http;
use super::prompts;
use super::provider::SemanticOracle;

/// Default Ollama host.
const DEFAULT_HOST: &str = "http://localhost:11434";

/// Ollama chat oracle.
pub struct OllamaOracle {
    client: Client,
    api_url: String,
    config: OracleConfig,
}

impl OllamaOracle {
    /// Create from configuration. `base_url` is the Ollama host.
    pub fn new(config: OracleConfig) -> Result<Self> {
        let client = http::build_client(config.timeout)?;
        let host = config.base_url.as_deref().unwrap_or(DEFAULT_HOST);
        let api_url = format!("{}/api/chat", host.trim_end_matches('/'));
        Ok(Self {
            client,
            api_url,
            config,
        })
    }
}

impl SemanticOracle for OllamaOracle {
    fn invoke(&self, prompt: &str) -> std::result::Result<String, OracleError> {
        let body = json!({
            "model": self.config.model,
            "stream": false,
            "options": {
                "temperature": self.config.temperature,
                "num_predict": self.config.max_tokens
            },
            "messages": [
                { "role": "system", "content": prompts::system_prompt() },
                { "role": "user", "content": prompt }
            ]
        });

        let headers =
            http::json_headers(&[]).map_err(|e| OracleError::Transport(e.to_string()))?;
        let reply = http::post_json(
            &self.client,
            &self.api_url,
            headers,
            &body,
            self.config.timeout,
        )
        .map_err(|e| match e {
            OracleError::Transport(msg) => OracleError::Transport(format!(
                "{} (is Ollama running? Start with: ollama serve)",
                msg
            )),
            other => other,
        })?;

        let text = reply
            .pointer("/message/content")
            .and_then(Value::as_str)
            .map(str::to_string);
        http::non_empty(text)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::OracleProvider;

    #[test]
    fn test_default_host() {
        let oracle = OllamaOracle::new(OracleConfig::new(OracleProvider::Ollama)).unwrap();
        assert_eq!(oracle.api_url, "http://localhost:11434/api/chat");
    }

    #[test]
    fn test_custom_host() {
        let config =
            OracleConfig::new(OracleProvider::Ollama).with_base_url("http://gpu-box:11434/");
        let oracle = OllamaOracle::new(config).unwrap();
        assert_eq!(oracle.api_url, "http://gpu-box:11434/api/chat");
    }
}
