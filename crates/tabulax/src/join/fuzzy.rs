//! Best-match left outer join under a distance threshold.
//!
//! Every source row is compared with every target row. The scan is
//! O(sources × targets) with no blocking or pruning, so it is the dominant
//! cost for large tables.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{Result, TabulaxError};
use crate::input::{Record, column_names, has_column};
use crate::model::TransformationCategory;

use super::distance::{Distance, DistanceMetric};

/// Comparisons above which a scan is logged as expensive.
const LARGE_SCAN: usize = 1_000_000;

/// Name of the distance column in flattened output.
pub const DISTANCE_COLUMN: &str = "join_distance";

/// Prefix applied to target columns in flattened output.
pub const TARGET_PREFIX: &str = "target_";

/// One source row and its best match, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinRecord {
    pub source: Record,
    pub target: Option<Record>,
    pub distance: Distance,
}

impl JoinRecord {
    pub fn is_matched(&self) -> bool {
        self.target.is_some()
    }
}

/// Join result, one record per source row in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinOutput {
    pub records: Vec<JoinRecord>,
    /// Union of target columns, used to null-fill unmatched rows.
    pub target_columns: Vec<String>,
}

impl JoinOutput {
    /// Number of source rows that found a match.
    pub fn matched_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_matched()).count()
    }

    /// Output column names that a source row already carries.
    pub fn colliding_columns(&self) -> Vec<String> {
        self.target_columns
            .iter()
            .map(|c| format!("{}{}", TARGET_PREFIX, c))
            .chain(std::iter::once(DISTANCE_COLUMN.to_string()))
            .filter(|c| self.records.iter().any(|r| r.source.contains_key(c)))
            .collect()
    }

    /// Flatten to records: source columns, `target_<col>` columns, `join_distance`.
    ///
    /// A source column with one of the output names is overwritten; see
    /// [`JoinOutput::colliding_columns`].
    pub fn flatten(&self) -> Vec<Record> {
        let collisions = self.colliding_columns();
        if !collisions.is_empty() {
            debug!(columns = ?collisions, "join output overwrites source columns");
        }
        self.records
            .iter()
            .map(|record| {
                let mut row = record.source.clone();
                for column in &self.target_columns {
                    let value = record
                        .target
                        .as_ref()
                        .and_then(|t| t.get(column).cloned())
                        .unwrap_or(Value::Null);
                    row.insert(format!("{}{}", TARGET_PREFIX, column), value);
                }
                row.insert(DISTANCE_COLUMN.to_string(), record.distance.to_value());
                row
            })
            .collect()
    }
}

/// Approximate join driven by a category's distance metric.
#[derive(Debug, Clone)]
pub struct FuzzyJoinEngine {
    metric: DistanceMetric,
}

impl FuzzyJoinEngine {
    /// Engine using the metric for `category`.
    pub fn new(category: TransformationCategory) -> Self {
        Self::with_metric(DistanceMetric::for_category(category))
    }

    /// Engine using an explicit metric.
    pub fn with_metric(metric: DistanceMetric) -> Self {
        Self { metric }
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Join `source` to `target` on the given key columns.
    ///
    /// A target qualifies when its distance is at most `max_distance`; the
    /// first target in input order with the smallest qualifying distance
    /// wins. Unmatched source rows are kept with no target.
    pub fn join(
        &self,
        source: &[Record],
        target: &[Record],
        source_key: &str,
        target_key: &str,
        max_distance: f64,
    ) -> Result<JoinOutput> {
        if max_distance.is_nan() || max_distance < 0.0 {
            return Err(TabulaxError::InvalidRequest(format!(
                "max distance must be a non-negative number, got {}",
                max_distance
            )));
        }
        if !source.is_empty() && !has_column(source, source_key) {
            return Err(TabulaxError::InvalidRequest(format!(
                "source column '{}' not found",
                source_key
            )));
        }
        if !target.is_empty() && !has_column(target, target_key) {
            return Err(TabulaxError::InvalidRequest(format!(
                "target column '{}' not found",
                target_key
            )));
        }

        let comparisons = source.len().saturating_mul(target.len());
        if comparisons > LARGE_SCAN {
            warn!(
                sources = source.len(),
                targets = target.len(),
                "fuzzy join scans every pair; expect a slow join"
            );
        }
        debug!(metric = ?self.metric, max_distance, comparisons, "joining");

        let null = Value::Null;
        let target_keys: Vec<&Value> = target
            .iter()
            .map(|row| row.get(target_key).unwrap_or(&null))
            .collect();

        let records: Vec<JoinRecord> = source
            .iter()
            .map(|row| {
                let key = row.get(source_key).unwrap_or(&null);
                let best = self.best_match(key, &target_keys, max_distance);
                JoinRecord {
                    source: row.clone(),
                    target: best.map(|(i, _)| target[i].clone()),
                    distance: best.map(|(_, d)| d).unwrap_or(Distance::Unbounded),
                }
            })
            .collect();

        let output = JoinOutput {
            records,
            target_columns: column_names(target),
        };
        info!(
            rows = output.records.len(),
            matched = output.matched_count(),
            "fuzzy join finished"
        );
        Ok(output)
    }

    /// Index and distance of the first strictly-smallest qualifying target.
    fn best_match(
        &self,
        key: &Value,
        target_keys: &[&Value],
        max_distance: f64,
    ) -> Option<(usize, Distance)> {
        let mut best: Option<(usize, Distance)> = None;
        for (i, candidate) in target_keys.iter().enumerate() {
            let d = self.metric.distance(key, candidate);
            if !d.within(max_distance) {
                continue;
            }
            if best.is_none_or(|(_, current)| d < current) {
                best = Some((i, d));
            }
        }
        best
    }
}
