//! Sufficient statistics exchanged between nodes and the coordinator.
//!
//! Each entry is a fixed-size summary from which the requested aggregate
//! can be reconstructed exactly, so no raw row ever leaves a node.

use crate::protocol::request::AggregationMethod;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sufficient statistics for one (feature, method) pair on one node.
///
/// Tagged by method so the coordinator never has to inspect payload shape
/// at runtime; the variant tells it which fields exist.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartialStat {
    /// Inputs for a global mean.
    Mean {
        /// Sum of the feature's local values.
        sum: f64,
        /// Number of local rows contributing to `sum`.
        count: u64,
    },
    /// Inputs for a global sample standard deviation.
    Std {
        /// Sum of the feature's local values.
        sum: f64,
        /// Number of local rows contributing to `sum`.
        count: u64,
        /// Sum of squared values, always non-negative.
        sum_of_squares: f64,
    },
}

impl PartialStat {
    /// The method this entry carries inputs for.
    pub fn method(&self) -> AggregationMethod {
        match self {
            Self::Mean { .. } => AggregationMethod::Mean,
            Self::Std { .. } => AggregationMethod::Std,
        }
    }

    /// Number of local rows behind this entry.
    pub fn count(&self) -> u64 {
        match self {
            Self::Mean { count, .. } | Self::Std { count, .. } => *count,
        }
    }
}

/// All sufficient statistics one node computed for one round.
///
/// Keyed by feature, then by method. `BTreeMap` keeps iteration order
/// deterministic, which the reduction relies on for reproducibility.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartialStatistics {
    entries: BTreeMap<String, BTreeMap<AggregationMethod, PartialStat>>,
}

impl PartialStatistics {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert statistics for a (feature, method) pair.
    ///
    /// The method key is taken from the stat's own variant, so an entry
    /// can never be filed under the wrong method.
    pub fn insert(&mut self, feature: &str, stat: PartialStat) {
        self.entries
            .entry(feature.to_string())
            .or_default()
            .insert(stat.method(), stat);
    }

    /// Look up statistics for a (feature, method) pair.
    pub fn get(&self, feature: &str, method: AggregationMethod) -> Option<&PartialStat> {
        self.entries.get(feature).and_then(|m| m.get(&method))
    }

    /// Features present in this set, in deterministic order.
    pub fn features(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Whether no entries were computed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of (feature, method) entries.
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }
}
