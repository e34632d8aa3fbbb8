//! Fuzzy joining of tables by category-specific distance.

mod distance;
mod fuzzy;

pub use distance::{Distance, DistanceMetric, edit_distance};
pub use fuzzy::{DISTANCE_COLUMN, FuzzyJoinEngine, JoinOutput, JoinRecord, TARGET_PREFIX};
