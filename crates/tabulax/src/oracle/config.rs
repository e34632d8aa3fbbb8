//! Oracle configuration and construction.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Result, TabulaxError};

use super::anthropic::AnthropicOracle;
use super::gemini::GeminiOracle;
use super::mock::MockOracle;
use super::ollama::OllamaOracle;
use super::openai::OpenAIOracle;
use super::provider::SemanticOracle;

/// Which oracle backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OracleProvider {
    /// Google Gemini API (requires GOOGLE_API_KEY)
    #[default]
    Gemini,
    /// Anthropic Claude API (requires ANTHROPIC_API_KEY)
    Anthropic,
    /// OpenAI Chat Completions API (requires OPENAI_API_KEY)
    OpenAI,
    /// Ollama local models (requires Ollama running)
    Ollama,
    /// Offline scripted oracle
    Mock,
}

impl OracleProvider {
    /// Environment variable holding this provider's API key, if it needs one.
    pub fn key_variable(&self) -> Option<&'static str> {
        match self {
            OracleProvider::Gemini => Some("GOOGLE_API_KEY"),
            OracleProvider::Anthropic => Some("ANTHROPIC_API_KEY"),
            OracleProvider::OpenAI => Some("OPENAI_API_KEY"),
            OracleProvider::Ollama | OracleProvider::Mock => None,
        }
    }

    /// Model used when none is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            OracleProvider::Gemini => "gemini-1.5-flash",
            OracleProvider::Anthropic => "claude-sonnet-4-20250514",
            OracleProvider::OpenAI => "gpt-4o-mini",
            OracleProvider::Ollama => "llama3.2",
            OracleProvider::Mock => "mock",
        }
    }

    /// Short name for logs and errors.
    pub fn as_str(&self) -> &'static str {
        match self {
            OracleProvider::Gemini => "gemini",
            OracleProvider::Anthropic => "anthropic",
            OracleProvider::OpenAI => "openai",
            OracleProvider::Ollama => "ollama",
            OracleProvider::Mock => "mock",
        }
    }
}

impl FromStr for OracleProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" | "google" => Ok(OracleProvider::Gemini),
            "anthropic" | "claude" => Ok(OracleProvider::Anthropic),
            "openai" | "gpt" => Ok(OracleProvider::OpenAI),
            "ollama" | "local" => Ok(OracleProvider::Ollama),
            "mock" | "offline" => Ok(OracleProvider::Mock),
            _ => Err(format!(
                "Unknown provider: {}. Use: gemini, anthropic, openai, ollama, or mock.",
                s
            )),
        }
    }
}

impl fmt::Display for OracleProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for an oracle backend.
///
/// Credentials are never defaulted: a provider that needs a key and has none
/// fails construction with [`TabulaxError::MissingCredential`].
#[derive(Clone)]
pub struct OracleConfig {
    /// Backend to talk to.
    pub provider: OracleProvider,
    /// Model name (provider-specific).
    pub model: String,
    /// API key, if the provider needs one.
    pub api_key: Option<String>,
    /// Override for the service endpoint.
    pub base_url: Option<String>,
    /// Sampling temperature.
    pub temperature: f64,
    /// Maximum tokens in a reply.
    pub max_tokens: usize,
    /// Per-call timeout; an expired call is an oracle error.
    pub timeout: Duration,
}

impl OracleConfig {
    /// Defaults for the given provider, without credentials.
    pub fn new(provider: OracleProvider) -> Self {
        let timeout = match provider {
            OracleProvider::Ollama => Duration::from_secs(120),
            _ => Duration::from_secs(60),
        };
        Self {
            provider,
            model: provider.default_model().to_string(),
            api_key: None,
            base_url: None,
            temperature: 0.7,
            max_tokens: 1024,
            timeout,
        }
    }

    /// Defaults plus the API key (and Ollama host) read from the environment.
    pub fn from_env(provider: OracleProvider) -> Result<Self> {
        let mut config = Self::new(provider);
        if let Some(variable) = provider.key_variable() {
            let key = std::env::var(variable)
                .ok()
                .filter(|k| !k.trim().is_empty())
                .ok_or(TabulaxError::MissingCredential {
                    provider: provider.as_str(),
                    variable,
                })?;
            config.api_key = Some(key);
        }
        if provider == OracleProvider::Ollama {
            config.base_url = std::env::var("OLLAMA_HOST").ok();
        }
        Ok(config)
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the endpoint override.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// The API key, or a typed error naming the variable to set.
    pub(crate) fn require_api_key(&self) -> Result<&str> {
        match (&self.api_key, self.provider.key_variable()) {
            (Some(key), _) if !key.trim().is_empty() => Ok(key),
            (_, Some(variable)) => Err(TabulaxError::MissingCredential {
                provider: self.provider.as_str(),
                variable,
            }),
            (_, None) => Err(TabulaxError::Config(format!(
                "{} does not take an API key",
                self.provider
            ))),
        }
    }
}

impl fmt::Debug for OracleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OracleConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Build the oracle described by `config`.
pub fn build_oracle(config: &OracleConfig) -> Result<Box<dyn SemanticOracle>> {
    let oracle: Box<dyn SemanticOracle> = match config.provider {
        OracleProvider::Gemini => Box::new(GeminiOracle::new(config.clone())?),
        OracleProvider::Anthropic => Box::new(AnthropicOracle::new(config.clone())?),
        OracleProvider::OpenAI => Box::new(OpenAIOracle::new(config.clone())?),
        OracleProvider::Ollama => Box::new(OllamaOracle::new(config.clone())?),
        OracleProvider::Mock => Box::new(MockOracle::new()),
    };
    Ok(oracle)
}
