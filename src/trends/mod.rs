//! Trend modules.
//!
//! Objection normalization and the aggregation of recent call analyses
//! into team-level trend narratives.

pub mod aggregator;
pub mod normalizer;

pub use aggregator::{compute_trends, group_by_representative, tally_objections, TrendConfig};
pub use normalizer::{normalize_objection, objection_distribution};
