//! Message exchange seam between the coordinator and the nodes.
//!
//! The real delivery mechanism (discovery, timeouts, retries) is owned by
//! an external messaging runtime; the aggregation core only sees this
//! trait. [`LocalExchange`] is the in-process implementation used by tests
//! and demos.

use crate::core::{NodeId, Result};
use crate::protocol::message::{QueryRequest, QueryReply};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::warn;

/// Handles one query on behalf of a node.
///
/// Implementations must convert node-local failures into error replies;
/// a handler never fails at the transport level.
pub trait QueryHandler: Send + Sync {
    /// Answer a query with partial statistics or a tagged error.
    fn handle(&self, request: &QueryRequest) -> QueryReply;
}

/// Transport seam used by the coordinator.
///
/// `send_and_receive` is a single synchronous barrier per round: the
/// returned replies may be an unordered subset of what was sent, per the
/// exchange's own delivery policy.
#[async_trait]
pub trait MessageExchange: Send + Sync {
    /// Nodes currently reachable through this exchange.
    async fn available_nodes(&self) -> Result<Vec<NodeId>>;

    /// Deliver one query per node and collect the replies that came back.
    async fn send_and_receive(&self, requests: Vec<QueryRequest>) -> Result<Vec<QueryReply>>;
}

/// In-process exchange backed by a registry of node handlers.
///
/// Queries addressed to unregistered nodes are dropped with a warning,
/// modeling lost delivery: the reply set is then a subset of the request
/// set, exactly as with a real transport.
#[derive(Default)]
pub struct LocalExchange {
    nodes: RwLock<HashMap<NodeId, Arc<dyn QueryHandler>>>,
}

impl LocalExchange {
    /// Create an empty exchange.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node handler, replacing any previous registration.
    pub fn register(&self, node_id: NodeId, handler: Arc<dyn QueryHandler>) {
        self.nodes.write().unwrap().insert(node_id, handler);
    }

    /// Remove a node from the registry.
    pub fn deregister(&self, node_id: NodeId) {
        self.nodes.write().unwrap().remove(&node_id);
    }
}

#[async_trait]
impl MessageExchange for LocalExchange {
    async fn available_nodes(&self) -> Result<Vec<NodeId>> {
        let nodes = self.nodes.read().unwrap();
        let mut ids: Vec<NodeId> = nodes.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }

    async fn send_and_receive(&self, requests: Vec<QueryRequest>) -> Result<Vec<QueryReply>> {
        // Snapshot handlers before awaiting so the lock is never held
        // across a suspension point.
        let deliverable: Vec<(QueryRequest, Arc<dyn QueryHandler>)> = {
            let nodes = self.nodes.read().unwrap();
            requests
                .into_iter()
                .filter_map(|request| match nodes.get(&request.dst_node_id) {
                    Some(handler) => Some((request, Arc::clone(handler))),
                    None => {
                        warn!(node = %request.dst_node_id, "dropping query for unregistered node");
                        None
                    }
                })
                .collect()
        };

        let replies = futures::future::join_all(
            deliverable
                .into_iter()
                .map(|(request, handler)| async move { handler.handle(&request) }),
        )
        .await;

        Ok(replies)
    }
}
