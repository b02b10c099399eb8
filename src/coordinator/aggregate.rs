//! Server-side reduction of partial statistics into global statistics.
//!
//! Sufficient statistics are additive: the global sum, count, and sum of
//! squares over the union of all nodes' rows equal the sums of the
//! node-local values. Reduction therefore sums the partials and derives
//! the final aggregates from the totals.

use crate::core::{Error, Result};
use crate::protocol::message::QueryReply;
use crate::protocol::request::{AggregationMethod, AggregationRequest};
use crate::protocol::stats::PartialStat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Running totals for one (feature, method) pair.
#[derive(Clone, Debug)]
enum Accumulator {
    Mean { sum: f64, count: u64 },
    Std { sum: f64, count: u64, sum_of_squares: f64 },
}

impl Accumulator {
    fn new(method: AggregationMethod) -> Self {
        match method {
            AggregationMethod::Mean => Self::Mean { sum: 0.0, count: 0 },
            AggregationMethod::Std => Self::Std { sum: 0.0, count: 0, sum_of_squares: 0.0 },
        }
    }

    /// Fold one node's partial into the totals.
    ///
    /// A variant mismatch means the reply was malformed for this entry;
    /// it contributes nothing.
    fn merge(&mut self, partial: &PartialStat) -> Result<()> {
        match (self, partial) {
            (Self::Mean { sum, count }, PartialStat::Mean { sum: s, count: c }) => {
                *sum += s;
                *count += c;
                Ok(())
            }
            (
                Self::Std { sum, count, sum_of_squares },
                PartialStat::Std { sum: s, count: c, sum_of_squares: ssq },
            ) => {
                *sum += s;
                *count += c;
                *sum_of_squares += ssq;
                Ok(())
            }
            (acc, partial) => Err(Error::Internal(format!(
                "partial statistic variant mismatch: expected {}, got {}",
                match acc {
                    Self::Mean { .. } => AggregationMethod::Mean,
                    Self::Std { .. } => AggregationMethod::Std,
                },
                partial.method()
            ))),
        }
    }

    /// Derive the final aggregate from the totals.
    fn finalize(&self, feature: &str) -> Result<f64> {
        match self {
            Self::Mean { sum, count } => {
                if *count == 0 {
                    return Err(Error::InsufficientData {
                        feature: feature.to_string(),
                        method: AggregationMethod::Mean.to_string(),
                    });
                }
                Ok(sum / *count as f64)
            }
            Self::Std { sum, count, sum_of_squares } => {
                // Sample std is undefined for fewer than 2 observations.
                if *count <= 1 {
                    return Err(Error::InsufficientData {
                        feature: feature.to_string(),
                        method: AggregationMethod::Std.to_string(),
                    });
                }
                let n = *count as f64;
                let mean = sum / n;
                // Var = (sum_sqd - n * mean^2) / (n - 1)
                let mut variance = (sum_of_squares - n * mean * mean) / (n - 1.0);
                if variance < 0.0 {
                    // Floating-point cancellation when the true variance is ~0.
                    variance = 0.0;
                }
                Ok(variance.sqrt())
            }
        }
    }
}

/// Final aggregated statistics for one round.
///
/// `None` marks a requested entry that could not be computed from the
/// available data, as opposed to an entry that was never requested
/// (absent from the map).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GlobalStatistics {
    /// Final value per feature and method.
    pub features: BTreeMap<String, BTreeMap<AggregationMethod, Option<f64>>>,
    /// Number of node replies that contributed data.
    pub valid_replies: usize,
}

impl GlobalStatistics {
    /// The computed value for a (feature, method) entry, if any.
    ///
    /// Collapses "not requested" and "could not be computed" into `None`;
    /// use [`GlobalStatistics::entry`] to distinguish them.
    pub fn value(&self, feature: &str, method: AggregationMethod) -> Option<f64> {
        self.entry(feature, method).flatten()
    }

    /// The entry for a (feature, method) pair.
    ///
    /// `None` = not requested; `Some(None)` = requested but uncomputable.
    pub fn entry(&self, feature: &str, method: AggregationMethod) -> Option<Option<f64>> {
        self.features.get(feature).and_then(|m| m.get(&method)).copied()
    }

    /// Render as indented JSON, the round's terminal report format.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.features)?)
    }
}

/// Reduce one round's replies into global statistics.
///
/// Only the zero-valid-replies condition fails the round; every other
/// problem is isolated to a single (feature, method) entry, which comes
/// back as `None` with a logged warning.
pub fn aggregate(replies: &[QueryReply], request: &AggregationRequest) -> Result<GlobalStatistics> {
    let valid: Vec<&QueryReply> = replies.iter().filter(|r| r.is_valid()).collect();
    if valid.is_empty() {
        return Err(Error::NoValidReplies);
    }

    let methods = request.recognized_methods(|unknown| {
        warn!(method = %unknown, "aggregation method not recognized, omitting from output");
    });

    // One accumulator per requested (feature, recognized method).
    let mut accumulators: BTreeMap<&str, BTreeMap<AggregationMethod, Accumulator>> = BTreeMap::new();
    for feature in &request.selected_features {
        let per_method = accumulators.entry(feature.as_str()).or_default();
        for method in &methods {
            per_method.insert(*method, Accumulator::new(*method));
        }
    }

    for reply in &valid {
        let Some(payload) = reply.payload.as_ref() else {
            continue;
        };
        for (feature, per_method) in &mut accumulators {
            for (method, accumulator) in per_method.iter_mut() {
                match payload.get(feature, *method) {
                    Some(partial) => {
                        if let Err(err) = accumulator.merge(partial) {
                            warn!(
                                node = %reply.node_id,
                                feature = %feature,
                                method = %method,
                                error = %err,
                                "skipping malformed partial statistic"
                            );
                        }
                    }
                    None => warn!(
                        node = %reply.node_id,
                        feature = %feature,
                        method = %method,
                        "reply missing expected entry"
                    ),
                }
            }
        }
    }

    let mut global = GlobalStatistics {
        valid_replies: valid.len(),
        ..GlobalStatistics::default()
    };
    for (feature, per_method) in &accumulators {
        let out = global.features.entry(feature.to_string()).or_default();
        for (method, accumulator) in per_method {
            let value = match accumulator.finalize(feature) {
                Ok(v) => Some(v),
                Err(err) => {
                    warn!(feature = %feature, method = %method, "{err}");
                    None
                }
            };
            out.insert(*method, value);
        }
    }

    Ok(global)
}
