//! Round configuration.

use crate::core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for one aggregation round.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoundConfig {
    /// Fraction of available nodes to sample, in (0, 1].
    pub fraction_sample: f64,
    /// Minimum number of connected nodes before a round may start.
    pub min_nodes: usize,
    /// Feature columns to aggregate, in order.
    pub selected_features: Vec<String>,
    /// Aggregation method names, in order.
    pub feature_aggregation: Vec<String>,
    /// Interval between node-availability polls.
    pub poll_interval: Duration,
    /// Upper bound on the wait for `min_nodes` to connect.
    pub wait_timeout: Duration,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            fraction_sample: 1.0,
            min_nodes: 1,
            selected_features: Vec::new(),
            feature_aggregation: Vec::new(),
            poll_interval: Duration::from_secs(2),
            wait_timeout: Duration::from_secs(60),
        }
    }
}

impl RoundConfig {
    /// Create a config with the given sampling parameters.
    pub fn new(fraction_sample: f64, min_nodes: usize) -> Self {
        Self {
            fraction_sample,
            min_nodes,
            ..Self::default()
        }
    }

    /// Set the features to aggregate.
    pub fn with_features(mut self, features: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.selected_features = features.into_iter().map(Into::into).collect();
        self
    }

    /// Set the aggregation methods.
    pub fn with_methods(mut self, methods: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.feature_aggregation = methods.into_iter().map(Into::into).collect();
        self
    }

    /// Set the features from a comma-separated list, e.g. `"age,income"`.
    pub fn with_features_csv(self, csv: &str) -> Self {
        let features = parse_csv_list(csv);
        self.with_features(features)
    }

    /// Set the methods from a comma-separated list, e.g. `"mean,std"`.
    pub fn with_methods_csv(self, csv: &str) -> Self {
        let methods = parse_csv_list(csv);
        self.with_methods(methods)
    }

    /// Set the node-availability poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the wait-for-nodes timeout.
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !(self.fraction_sample > 0.0 && self.fraction_sample <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "fraction_sample must be in (0, 1], got {}",
                self.fraction_sample
            )));
        }
        if self.min_nodes == 0 {
            return Err(Error::InvalidConfig("min_nodes must be at least 1".to_string()));
        }
        if self.selected_features.is_empty() {
            return Err(Error::InvalidConfig("selected_features must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Split a comma-separated list, trimming whitespace and dropping empties.
pub fn parse_csv_list(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
