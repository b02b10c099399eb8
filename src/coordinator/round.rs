//! Round orchestration: sample, dispatch, await, reduce.

use crate::coordinator::aggregate::{aggregate, GlobalStatistics};
use crate::coordinator::config::RoundConfig;
use crate::coordinator::sampler::NodeSampler;
use crate::core::{NodeId, Result};
use crate::protocol::exchange::MessageExchange;
use crate::protocol::message::QueryRequest;
use crate::protocol::request::AggregationRequest;
use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Lifecycle of one round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundPhase {
    Sampling,
    Dispatching,
    AwaitingReplies,
    Reducing,
    Done,
}

impl std::fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Sampling => "sampling",
            Self::Dispatching => "dispatching",
            Self::AwaitingReplies => "awaiting-replies",
            Self::Reducing => "reducing",
            Self::Done => "done",
        };
        write!(f, "{name}")
    }
}

/// Terminal output of one round.
#[derive(Clone, Debug)]
pub struct RoundOutcome {
    /// Round number.
    pub round: u64,
    /// Nodes available when the round started.
    pub available_nodes: usize,
    /// Nodes actually sampled.
    pub sampled_nodes: Vec<NodeId>,
    /// The aggregated statistics.
    pub statistics: GlobalStatistics,
}

/// Drives aggregation rounds against a message exchange.
///
/// One round at a time; there is no retry inside a round — a failed
/// round is rerun by the caller with a fresh sample if desired.
pub struct Coordinator<E, R> {
    exchange: E,
    config: RoundConfig,
    sampler: NodeSampler,
    rng: R,
    cancel: CancellationToken,
    round: u64,
}

impl<E: MessageExchange, R: Rng> Coordinator<E, R> {
    /// Create a coordinator.
    ///
    /// The RNG is caller-supplied so node sampling is reproducible under
    /// a seeded generator.
    pub fn new(exchange: E, config: RoundConfig, rng: R) -> Result<Self> {
        config.validate()?;
        let sampler =
            NodeSampler::new(config.fraction_sample, config.min_nodes, config.poll_interval)?;
        Ok(Self {
            exchange,
            config,
            sampler,
            rng,
            cancel: CancellationToken::new(),
            round: 0,
        })
    }

    /// Token that aborts an in-flight wait for nodes.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Rounds completed or attempted so far.
    pub fn round(&self) -> u64 {
        self.round
    }

    /// Run one full aggregation round.
    pub async fn run_round(&mut self) -> Result<RoundOutcome> {
        self.round += 1;
        let round = self.round;
        info!(
            round,
            features = ?self.config.selected_features,
            methods = ?self.config.feature_aggregation,
            "starting aggregation round"
        );

        debug!(round, phase = %RoundPhase::Sampling, "round phase");
        let available = self
            .sampler
            .wait_for_nodes(&self.exchange, self.config.wait_timeout, &self.cancel)
            .await?;
        let sampled = self.sampler.sample(&available, &mut self.rng);
        info!(round, sampled = sampled.len(), available = available.len(), "sampled nodes");

        debug!(round, phase = %RoundPhase::Dispatching, "round phase");
        let request = AggregationRequest::new(
            self.config.selected_features.clone(),
            self.config.feature_aggregation.clone(),
        );
        let queries: Vec<QueryRequest> = sampled
            .iter()
            .map(|node_id| QueryRequest::new(round, *node_id, request.clone()))
            .collect();
        let sent = queries.len();

        debug!(round, phase = %RoundPhase::AwaitingReplies, "round phase");
        let replies = self.exchange.send_and_receive(queries).await?;
        info!(round, received = replies.len(), sent, "received replies");

        debug!(round, phase = %RoundPhase::Reducing, "round phase");
        let statistics = aggregate(&replies, &request)?;

        debug!(round, phase = %RoundPhase::Done, "round phase");
        Ok(RoundOutcome {
            round,
            available_nodes: available.len(),
            sampled_nodes: sampled,
            statistics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Error;
    use crate::node::dataset::MemoryDataset;
    use crate::node::service::StatisticsNode;
    use crate::protocol::exchange::LocalExchange;
    use crate::protocol::request::AggregationMethod;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;
    use std::time::Duration;

    fn register_node(exchange: &LocalExchange, id: u64, values: &[f64]) {
        let node = StatisticsNode::new(
            NodeId::new(id),
            MemoryDataset::new().with_column("age", values.to_vec()),
        );
        exchange.register(NodeId::new(id), Arc::new(node));
    }

    fn test_config() -> RoundConfig {
        RoundConfig::new(1.0, 1)
            .with_features(["age"])
            .with_methods(["mean", "std"])
            .with_poll_interval(Duration::from_millis(5))
            .with_wait_timeout(Duration::from_millis(200))
    }

    #[tokio::test]
    async fn test_full_round_end_to_end() {
        crate::telemetry::init();
        let exchange = LocalExchange::new();
        register_node(&exchange, 1, &[2.0, 4.0, 4.0, 4.0]);
        register_node(&exchange, 2, &[5.0, 5.0, 7.0, 9.0]);

        let mut coordinator =
            Coordinator::new(exchange, test_config(), StdRng::seed_from_u64(1)).unwrap();
        let outcome = coordinator.run_round().await.unwrap();

        assert_eq!(outcome.round, 1);
        assert_eq!(outcome.available_nodes, 2);
        assert_eq!(outcome.sampled_nodes.len(), 2);
        assert_eq!(outcome.statistics.valid_replies, 2);

        let mean = outcome.statistics.value("age", AggregationMethod::Mean).unwrap();
        assert!((mean - 5.0).abs() < 1e-9);
        // Sample std of [2,4,4,4,5,5,7,9] = sqrt(32/7).
        let std = outcome.statistics.value("age", AggregationMethod::Std).unwrap();
        assert!((std - (32.0f64 / 7.0).sqrt()).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_round_survives_failing_node() {
        let exchange = LocalExchange::new();
        register_node(&exchange, 1, &[10.0, 20.0]);
        // Node 2 is missing the "age" column and will reply with an error.
        let broken = StatisticsNode::new(
            NodeId::new(2),
            MemoryDataset::new().with_column("income", vec![1.0]),
        );
        exchange.register(NodeId::new(2), Arc::new(broken));

        let mut coordinator =
            Coordinator::new(exchange, test_config(), StdRng::seed_from_u64(2)).unwrap();
        let outcome = coordinator.run_round().await.unwrap();

        assert_eq!(outcome.statistics.valid_replies, 1);
        let mean = outcome.statistics.value("age", AggregationMethod::Mean).unwrap();
        assert!((mean - 15.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_round_fails_when_all_nodes_error() {
        let exchange = LocalExchange::new();
        let broken = StatisticsNode::new(NodeId::new(1), MemoryDataset::new());
        exchange.register(NodeId::new(1), Arc::new(broken));

        let mut coordinator =
            Coordinator::new(exchange, test_config(), StdRng::seed_from_u64(3)).unwrap();
        let err = coordinator.run_round().await.unwrap_err();
        assert!(matches!(err, Error::NoValidReplies));
    }

    #[tokio::test]
    async fn test_wait_timeout_without_nodes() {
        let exchange = LocalExchange::new();
        let mut coordinator =
            Coordinator::new(exchange, test_config(), StdRng::seed_from_u64(4)).unwrap();

        let err = coordinator.run_round().await.unwrap_err();
        assert!(matches!(err, Error::WaitTimedOut { required: 1 }));
    }

    #[tokio::test]
    async fn test_cancellation_aborts_round() {
        let exchange = LocalExchange::new();
        let config = test_config().with_wait_timeout(Duration::from_secs(30));
        let mut coordinator =
            Coordinator::new(exchange, config, StdRng::seed_from_u64(5)).unwrap();

        let cancel = coordinator.cancellation_token();
        let handle = tokio::spawn(async move { coordinator.run_round().await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();

        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err, Error::RoundCancelled));
    }

    #[tokio::test]
    async fn test_fraction_samples_subset() {
        let exchange = LocalExchange::new();
        for id in 0..10 {
            register_node(&exchange, id, &[1.0, 2.0, 3.0]);
        }
        let config = test_config().with_methods(["mean"]);
        let config = RoundConfig { fraction_sample: 0.5, ..config };

        let mut coordinator =
            Coordinator::new(exchange, config, StdRng::seed_from_u64(6)).unwrap();
        let outcome = coordinator.run_round().await.unwrap();

        assert_eq!(outcome.sampled_nodes.len(), 5);
        assert_eq!(outcome.statistics.valid_replies, 5);
        // Every node holds the same data, so the mean is partition-free.
        let mean = outcome.statistics.value("age", AggregationMethod::Mean).unwrap();
        assert!((mean - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let exchange = LocalExchange::new();
        let config = RoundConfig::new(2.0, 1).with_features(["age"]);
        let result = Coordinator::new(exchange, config, StdRng::seed_from_u64(7));
        assert!(result.is_err());
    }

    #[test]
    fn test_round_phase_display() {
        assert_eq!(RoundPhase::AwaitingReplies.to_string(), "awaiting-replies");
        assert_eq!(RoundPhase::Done.to_string(), "done");
    }
}
