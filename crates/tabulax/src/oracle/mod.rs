//! Semantic oracle integration.
//!
//! The oracle is an external text-in/text-out inference service used by the
//! classifier, the code synthesizer, and the lookup engine. Every call is
//! fallible and non-deterministic.
//!
//! # Supported Providers
//!
//! - **Gemini** - Google models via API (requires `GOOGLE_API_KEY`)
//! - **Anthropic** - Claude models via API (requires `ANTHROPIC_API_KEY`)
//! - **OpenAI** - GPT models via API (requires `OPENAI_API_KEY`)
//! - **Ollama** - Local models, no API key needed (requires Ollama installed)
//! - **Mock** - Scripted replies for tests and offline runs
//!
//! # Example
//!
//! ```no_run
//! use tabulax::oracle::{OracleConfig, OracleProvider, build_oracle};
//!
//! let config = OracleConfig::from_env(OracleProvider::Gemini).unwrap();
//! let oracle = build_oracle(&config).unwrap();
//! let reply = oracle.invoke("Say hello").unwrap();
//! ```

mod anthropic;
mod config;
mod gemini;
mod http;
mod mock;
mod ollama;
mod openai;
pub mod prompts;
mod provider;
pub mod reply;

pub use anthropic::AnthropicOracle;
pub use config::{OracleConfig, OracleProvider, build_oracle};
pub use gemini::GeminiOracle;
pub use mock::MockOracle;
pub use ollama::OllamaOracle;
pub use openai::OpenAIOracle;
pub use provider::SemanticOracle;
