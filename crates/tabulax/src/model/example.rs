//! Source→target example pairs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::input::cell_text;

/// One observed source→target pair.
///
/// Both sides are trimmed and non-empty; pairs that would violate this are
/// never constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamplePair {
    pub source: String,
    pub target: String,
}

impl ExamplePair {
    /// Build a pair, returning `None` if either side is empty after trimming.
    pub fn new(source: impl AsRef<str>, target: impl AsRef<str>) -> Option<Self> {
        let source = source.as_ref().trim();
        let target = target.as_ref().trim();
        if source.is_empty() || target.is_empty() {
            return None;
        }
        Some(Self {
            source: source.to_string(),
            target: target.to_string(),
        })
    }

    /// Render as `"source" -> "target"` for prompts.
    pub fn quoted(&self) -> String {
        format!("\"{}\" -> \"{}\"", self.source, self.target)
    }
}

/// A validated, ordered collection of example pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ExamplePair>", into = "Vec<ExamplePair>")]
pub struct ExampleSet {
    pairs: Vec<ExamplePair>,
}

impl ExampleSet {
    /// Build from (source, target) tuples, discarding invalid pairs.
    pub fn from_pairs<I, S, T>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .filter_map(|(s, t)| ExamplePair::new(s, t))
                .collect(),
        }
    }

    /// Build from two parallel string sequences.
    ///
    /// Sequences of different length are truncated to the common length.
    pub fn from_parallel<S: AsRef<str>, T: AsRef<str>>(source: &[S], target: &[T]) -> Self {
        warn_on_length_mismatch(source.len(), target.len());
        Self::from_pairs(source.iter().zip(target.iter()))
    }

    /// Build from two parallel columns of cell values.
    ///
    /// Null cells and cells that are empty after trimming drop their pair.
    pub fn from_columns(source: &[Value], target: &[Value]) -> Self {
        warn_on_length_mismatch(source.len(), target.len());
        let pairs = source.iter().zip(target.iter()).filter_map(|(s, t)| {
            let s = cell_text(s)?;
            let t = cell_text(t)?;
            ExamplePair::new(s, t)
        });
        Self {
            pairs: pairs.collect(),
        }
    }

    /// All pairs, in input order.
    pub fn pairs(&self) -> &[ExamplePair] {
        &self.pairs
    }

    /// The first `n` pairs (or all, if fewer).
    pub fn head(&self, n: usize) -> &[ExamplePair] {
        &self.pairs[..n.min(self.pairs.len())]
    }

    /// Number of valid pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether no valid pair survived.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Source values, in order.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|p| p.source.as_str())
    }

    /// Target values, in order.
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|p| p.target.as_str())
    }
}

impl From<Vec<ExamplePair>> for ExampleSet {
    fn from(pairs: Vec<ExamplePair>) -> Self {
        Self::from_pairs(pairs.into_iter().map(|p| (p.source, p.target)))
    }
}

impl From<ExampleSet> for Vec<ExamplePair> {
    fn from(set: ExampleSet) -> Self {
        set.pairs
    }
}

fn warn_on_length_mismatch(source_len: usize, target_len: usize) {
    if source_len != target_len {
        warn!(
            source_len,
            target_len,
            common_len = source_len.min(target_len),
            "example arrays differ in length; truncating to common length"
        );
    }
}
