//! Node-side query service.

use crate::core::NodeId;
use crate::node::compute::compute_partial_statistics;
use crate::node::dataset::Dataset;
use crate::protocol::exchange::QueryHandler;
use crate::protocol::message::{QueryReply, QueryRequest};
use tracing::{debug, warn};

/// A participant node answering statistics queries over its local data.
///
/// Node-local failures become tagged error replies, never transport
/// errors, so one node's failure cannot block the rest of a round.
pub struct StatisticsNode<D> {
    node_id: NodeId,
    dataset: D,
}

impl<D: Dataset> StatisticsNode<D> {
    /// Create a node serving queries over the given dataset.
    pub fn new(node_id: NodeId, dataset: D) -> Self {
        Self { node_id, dataset }
    }

    /// This node's identifier.
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }
}

impl<D: Dataset> QueryHandler for StatisticsNode<D> {
    fn handle(&self, request: &QueryRequest) -> QueryReply {
        debug!(node = %self.node_id, round = request.round, "handling query");
        match compute_partial_statistics(&self.dataset, &request.request) {
            Ok(partials) => QueryReply::ok(request, self.node_id, partials),
            Err(err) => {
                warn!(node = %self.node_id, error = %err, "local computation failed");
                QueryReply::error(request, self.node_id, &err.to_string())
            }
        }
    }
}
