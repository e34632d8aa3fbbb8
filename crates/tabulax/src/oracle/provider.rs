//! The semantic oracle trait.

use std::sync::Arc;

use crate::error::OracleError;

/// An external text-in/text-out inference service.
///
/// Replies are non-deterministic and calls are fallible; callers must treat
/// every reply as best-effort. Implementations must be thread-safe (Send +
/// Sync) so one oracle can be shared by every engine in a request.
pub trait SemanticOracle: Send + Sync {
    /// Send a prompt and return the reply text.
    fn invoke(&self, prompt: &str) -> Result<String, OracleError>;

    /// Name of this oracle (for logging/debugging).
    fn name(&self) -> &str;
}

impl<T: SemanticOracle + ?Sized> SemanticOracle for Arc<T> {
    fn invoke(&self, prompt: &str) -> Result<String, OracleError> {
        (**self).invoke(prompt)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<T: SemanticOracle + ?Sized> SemanticOracle for Box<T> {
    fn invoke(&self, prompt: &str) -> Result<String, OracleError> {
        (**self).invoke(prompt)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
