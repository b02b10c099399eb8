//! Aggregation request broadcast to sampled nodes.

use crate::core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Statistics a node can be asked to compute.
///
/// Methods travel as raw strings in [`AggregationRequest`] so that a
/// coordinator and a node with different vocabularies interoperate;
/// each side parses with [`AggregationMethod::parse`] and skips what it
/// does not recognize.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMethod {
    /// Arithmetic mean
    Mean,
    /// Sample standard deviation (Bessel-corrected)
    Std,
}

impl AggregationMethod {
    /// Parse a method name.
    ///
    /// Unrecognized names yield [`Error::UnsupportedMethod`]; call sites
    /// are expected to log and skip rather than abort.
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim() {
            "mean" => Ok(Self::Mean),
            "std" => Ok(Self::Std),
            other => Err(Error::UnsupportedMethod(other.to_string())),
        }
    }

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Std => "std",
        }
    }
}

impl std::fmt::Display for AggregationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AggregationMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// The request broadcast identically to every sampled node in a round.
///
/// Immutable once created; the coordinator builds one per round and each
/// node reads it to drive its local computation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregationRequest {
    /// Feature columns to compute statistics for, in order.
    pub selected_features: Vec<String>,
    /// Requested aggregation method names, in order.
    pub aggregation_methods: Vec<String>,
}

impl AggregationRequest {
    /// Create a new request.
    pub fn new(
        selected_features: impl IntoIterator<Item = impl Into<String>>,
        aggregation_methods: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            selected_features: selected_features.into_iter().map(Into::into).collect(),
            aggregation_methods: aggregation_methods.into_iter().map(Into::into).collect(),
        }
    }

    /// Methods that parse to a recognized [`AggregationMethod`].
    ///
    /// Unknown names are reported through `on_unknown` exactly once each
    /// and omitted; duplicates are collapsed preserving first occurrence.
    pub fn recognized_methods(&self, mut on_unknown: impl FnMut(&str)) -> Vec<AggregationMethod> {
        let mut methods = Vec::new();
        for name in &self.aggregation_methods {
            match AggregationMethod::parse(name) {
                Ok(m) if !methods.contains(&m) => methods.push(m),
                Ok(_) => {}
                Err(_) => on_unknown(name),
            }
        }
        methods
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_methods() {
        assert_eq!(AggregationMethod::parse("mean").unwrap(), AggregationMethod::Mean);
        assert_eq!(AggregationMethod::parse("std").unwrap(), AggregationMethod::Std);
        assert_eq!(AggregationMethod::parse(" mean ").unwrap(), AggregationMethod::Mean);
    }

    #[test]
    fn test_parse_unknown_method() {
        let err = AggregationMethod::parse("median").unwrap_err();
        assert!(matches!(err, Error::UnsupportedMethod(ref m) if m == "median"));
    }

    #[test]
    fn test_method_serde_lowercase() {
        let json = serde_json::to_string(&AggregationMethod::Std).unwrap();
        assert_eq!(json, "\"std\"");
    }

    #[test]
    fn test_recognized_methods_skips_unknown() {
        let request = AggregationRequest::new(["age"], ["mean", "median", "std"]);
        let mut skipped = Vec::new();
        let methods = request.recognized_methods(|m| skipped.push(m.to_string()));
        assert_eq!(methods, vec![AggregationMethod::Mean, AggregationMethod::Std]);
        assert_eq!(skipped, vec!["median".to_string()]);
    }

    #[test]
    fn test_recognized_methods_dedupes() {
        let request = AggregationRequest::new(["age"], ["mean", "mean"]);
        let methods = request.recognized_methods(|_| {});
        assert_eq!(methods, vec![AggregationMethod::Mean]);
    }
}
