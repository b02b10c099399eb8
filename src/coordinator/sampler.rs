//! Node sampling for round participation.

use crate::core::{Error, NodeId, Result};
use crate::protocol::exchange::MessageExchange;
use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Samples a uniform subset of the available nodes for one round.
pub struct NodeSampler {
    fraction: f64,
    min_nodes: usize,
    poll_interval: Duration,
}

impl NodeSampler {
    /// Create a sampler.
    ///
    /// `fraction` must lie in (0, 1] and `min_nodes` must be at least 1.
    pub fn new(fraction: f64, min_nodes: usize, poll_interval: Duration) -> Result<Self> {
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "sample fraction must be in (0, 1], got {fraction}"
            )));
        }
        if min_nodes == 0 {
            return Err(Error::InvalidConfig("min_nodes must be at least 1".to_string()));
        }
        Ok(Self { fraction, min_nodes, poll_interval })
    }

    /// Number of nodes to draw from `available` candidates.
    ///
    /// Truncates `available * fraction` but never returns 0 while nodes
    /// exist, so a positive fraction cannot produce a degenerate round.
    pub fn sample_size(&self, available: usize) -> usize {
        if available == 0 {
            return 0;
        }
        ((available as f64 * self.fraction) as usize).max(1)
    }

    /// Draw a uniform sample without replacement.
    ///
    /// The RNG is caller-supplied so sampling is reproducible under a
    /// seeded generator.
    pub fn sample<R: Rng + ?Sized>(&self, available: &[NodeId], rng: &mut R) -> Vec<NodeId> {
        let k = self.sample_size(available.len());
        available.choose_multiple(rng, k).copied().collect()
    }

    /// Poll the exchange until at least `min_nodes` nodes are available.
    ///
    /// Bounded by `wait_timeout` and abortable through `cancel`; the
    /// original unbounded busy-wait is deliberately not reproduced.
    pub async fn wait_for_nodes<E: MessageExchange + ?Sized>(
        &self,
        exchange: &E,
        wait_timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Vec<NodeId>> {
        let poll = async {
            loop {
                let nodes = exchange.available_nodes().await?;
                if nodes.len() >= self.min_nodes {
                    return Ok(nodes);
                }
                info!(
                    available = nodes.len(),
                    required = self.min_nodes,
                    "waiting for nodes to connect"
                );
                tokio::time::sleep(self.poll_interval).await;
            }
        };

        tokio::select! {
            _ = cancel.cancelled() => Err(Error::RoundCancelled),
            outcome = tokio::time::timeout(wait_timeout, poll) => match outcome {
                Ok(nodes) => nodes,
                Err(_) => Err(Error::WaitTimedOut { required: self.min_nodes }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::exchange::LocalExchange;
    use crate::protocol::message::{QueryReply, QueryRequest};
    use crate::protocol::exchange::QueryHandler;
    use crate::protocol::stats::PartialStatistics;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    struct NullHandler(NodeId);

    impl QueryHandler for NullHandler {
        fn handle(&self, request: &QueryRequest) -> QueryReply {
            QueryReply::ok(request, self.0, PartialStatistics::new())
        }
    }

    fn ids(range: std::ops::Range<u64>) -> Vec<NodeId> {
        range.map(NodeId::new).collect()
    }

    fn sampler(fraction: f64, min_nodes: usize) -> NodeSampler {
        NodeSampler::new(fraction, min_nodes, Duration::from_millis(5)).unwrap()
    }

    #[test]
    fn test_invalid_construction() {
        assert!(NodeSampler::new(0.0, 1, Duration::from_secs(1)).is_err());
        assert!(NodeSampler::new(1.1, 1, Duration::from_secs(1)).is_err());
        assert!(NodeSampler::new(0.5, 0, Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_sample_size_floor() {
        let s = sampler(0.5, 1);
        assert_eq!(s.sample_size(10), 5);
        assert_eq!(s.sample_size(5), 2);
        assert_eq!(s.sample_size(0), 0);
    }

    #[test]
    fn test_sample_size_never_zero_with_nodes() {
        // 0.1 * 3 truncates to 0; a degenerate round must be avoided
        let s = sampler(0.1, 1);
        assert_eq!(s.sample_size(3), 1);
    }

    #[test]
    fn test_sample_without_replacement() {
        let s = sampler(0.5, 1);
        let available = ids(0..10);
        let mut rng = StdRng::seed_from_u64(7);

        let sampled = s.sample(&available, &mut rng);
        assert_eq!(sampled.len(), 5);
        let mut unique = sampled.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), sampled.len());
        assert!(sampled.iter().all(|id| available.contains(id)));
    }

    #[test]
    fn test_seeded_sampling_is_reproducible() {
        let s = sampler(0.3, 1);
        let available = ids(0..20);

        let a = s.sample(&available, &mut StdRng::seed_from_u64(42));
        let b = s.sample(&available, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_wait_returns_when_enough_nodes() {
        let exchange = LocalExchange::new();
        exchange.register(NodeId::new(1), Arc::new(NullHandler(NodeId::new(1))));
        exchange.register(NodeId::new(2), Arc::new(NullHandler(NodeId::new(2))));

        let s = sampler(1.0, 2);
        let cancel = CancellationToken::new();
        let nodes = s
            .wait_for_nodes(&exchange, Duration::from_millis(200), &cancel)
            .await
            .unwrap();
        assert_eq!(nodes.len(), 2);
    }

    #[tokio::test]
    async fn test_wait_times_out() {
        let exchange = LocalExchange::new();
        let s = sampler(1.0, 3);
        let cancel = CancellationToken::new();

        let err = s
            .wait_for_nodes(&exchange, Duration::from_millis(30), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::WaitTimedOut { required: 3 }));
    }

    #[tokio::test]
    async fn test_wait_observes_cancellation() {
        let exchange = LocalExchange::new();
        let s = sampler(1.0, 3);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = s
            .wait_for_nodes(&exchange, Duration::from_secs(10), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RoundCancelled));
    }
}
