//! Local dataset access for node-side computation.
//!
//! Real deployments back this trait with a SQL query or a file load;
//! the aggregation core only ever sees the trait.

use crate::core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Read-only view of a node's private local data.
pub trait Dataset: Send + Sync {
    /// The local values of one feature column.
    ///
    /// Implementations must omit missing rows, so the returned length is
    /// the feature's non-missing row count. Fails with
    /// [`Error::FeatureNotFound`] when the column does not exist.
    fn feature_values(&self, feature: &str) -> Result<Vec<f64>>;
}

/// Column-oriented in-memory dataset.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MemoryDataset {
    columns: HashMap<String, Vec<f64>>,
}

impl MemoryDataset {
    /// Create an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column, replacing any existing one with the same name.
    pub fn with_column(mut self, name: &str, values: impl Into<Vec<f64>>) -> Self {
        self.columns.insert(name.to_string(), values.into());
        self
    }

    /// Whether a column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

impl Dataset for MemoryDataset {
    fn feature_values(&self, feature: &str) -> Result<Vec<f64>> {
        self.columns
            .get(feature)
            .cloned()
            .ok_or_else(|| Error::FeatureNotFound(feature.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_column() {
        let dataset = MemoryDataset::new().with_column("age", vec![1.0, 2.0, 3.0]);
        assert_eq!(dataset.feature_values("age").unwrap(), vec![1.0, 2.0, 3.0]);
        assert!(dataset.has_column("age"));
    }

    #[test]
    fn test_missing_column() {
        let dataset = MemoryDataset::new().with_column("age", vec![1.0]);
        let err = dataset.feature_values("income").unwrap_err();
        assert!(matches!(err, Error::FeatureNotFound(ref f) if f == "income"));
    }
}
