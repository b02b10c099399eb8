//! Partial statistics computation on a node's local data.

use crate::core::Result;
use crate::node::dataset::Dataset;
use crate::protocol::request::{AggregationMethod, AggregationRequest};
use crate::protocol::stats::{PartialStat, PartialStatistics};
use tracing::warn;

/// Compute sufficient statistics for every requested (feature, method) pair.
///
/// A feature absent from the dataset fails the whole computation — there is
/// no per-feature partial success, so a node either contributes a complete
/// payload or an error reply. Unrecognized method names are logged and
/// skipped without failing the request.
pub fn compute_partial_statistics(
    dataset: &dyn Dataset,
    request: &AggregationRequest,
) -> Result<PartialStatistics> {
    let mut partials = PartialStatistics::new();

    for feature in &request.selected_features {
        let values = dataset.feature_values(feature)?;
        let sum: f64 = values.iter().sum();
        let count = values.len() as u64;

        for method in &request.aggregation_methods {
            match AggregationMethod::parse(method) {
                Ok(AggregationMethod::Mean) => {
                    partials.insert(feature, PartialStat::Mean { sum, count });
                }
                Ok(AggregationMethod::Std) => {
                    let sum_of_squares: f64 = values.iter().map(|v| v * v).sum();
                    partials.insert(
                        feature,
                        PartialStat::Std { sum, count, sum_of_squares },
                    );
                }
                Err(_) => {
                    warn!(method = %method, "aggregation method not recognized, skipping");
                }
            }
        }
    }

    Ok(partials)
}
