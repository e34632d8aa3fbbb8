//! Error types for the TabulaX library.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Main error type for TabulaX operations.
#[derive(Debug, Error)]
pub enum TabulaxError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Regex compilation error.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// Empty file or no data to work with.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// The request itself is malformed (missing column, empty table, ...).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A value that must be numeric could not be parsed.
    #[error("Non-numeric value at example {index}: '{value}'")]
    NonNumeric { index: usize, value: String },

    /// The semantic oracle failed.
    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    /// No executable rule could be produced from the oracle's reply.
    #[error("Rule synthesis failed: {0}")]
    Synthesis(String),

    /// A rule program failed validation or execution.
    #[error("Rule error: {0}")]
    Rule(#[from] RuleError),

    /// A required credential is absent from the configuration.
    #[error("Missing credential for {provider}: set {variable}")]
    MissingCredential {
        provider: &'static str,
        variable: &'static str,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Failures talking to the semantic oracle.
///
/// Every variant is recoverable from the caller's point of view: the engines
/// downgrade these to a degraded-but-valid result instead of aborting.
#[derive(Debug, Error)]
pub enum OracleError {
    /// Connection or protocol failure.
    #[error("request failed: {0}")]
    Transport(String),

    /// The call exceeded its per-call timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The service answered with a non-success status.
    #[error("service returned {code}: {body}")]
    Status { code: u16, body: String },

    /// The service answered but produced no text.
    #[error("empty reply")]
    EmptyReply,

    /// The reply could not be decoded.
    #[error("malformed reply: {0}")]
    MalformedReply(String),
}

impl OracleError {
    /// Map a reqwest error, keeping timeouts distinct.
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            OracleError::Timeout(timeout)
        } else {
            OracleError::Transport(err.to_string())
        }
    }
}

/// Failures validating or running a rule program.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleError {
    /// The program has more steps than allowed.
    #[error("program has {count} steps (limit {limit})")]
    TooManySteps { count: usize, limit: usize },

    /// A step's parameters are invalid.
    #[error("step {step} ({op}): {message}")]
    InvalidStep {
        step: usize,
        op: &'static str,
        message: String,
    },

    /// A step failed on a particular value.
    #[error("step {step} ({op}) failed: {message}")]
    StepFailed {
        step: usize,
        op: &'static str,
        message: String,
    },

    /// An intermediate value grew beyond the configured bound.
    #[error("value exceeded {limit} bytes at step {step}")]
    ValueTooLong { step: usize, limit: usize },
}

/// Result type alias for TabulaX operations.
pub type Result<T> = std::result::Result<T, TabulaxError>;
