//! Relationship naming ("[source type] to [target type]").

use tracing::debug;

use crate::error::OracleError;
use crate::model::ExamplePair;
use crate::oracle::reply::relationship_from_reply;
use crate::oracle::{SemanticOracle, prompts};

/// Label used when the naming call fails.
pub const RELATIONSHIP_ERROR: &str = "Error detecting relationship";

/// Label used when there are no examples to name.
pub const RELATIONSHIP_UNKNOWN: &str = "Unknown (no examples)";

/// Ask the oracle to name the relationship shown by `pairs`.
pub fn name_relationship(
    oracle: &dyn SemanticOracle,
    pairs: &[ExamplePair],
) -> Result<String, OracleError> {
    let reply = oracle.invoke(&prompts::relationship_prompt(pairs))?;
    let relationship = relationship_from_reply(&reply);
    if relationship.is_empty() {
        return Err(OracleError::EmptyReply);
    }
    debug!(relationship = %relationship, "named relationship");
    Ok(relationship)
}
