//! Query protocol messages exchanged between coordinator and nodes.

use crate::core::{now, NodeId, Result, Timestamp};
use crate::protocol::request::AggregationRequest;
use crate::protocol::stats::PartialStatistics;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A query sent to one node, carrying the round's aggregation request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Message ID
    pub id: String,
    /// Round this query belongs to
    pub round: u64,
    /// Destination node
    pub dst_node_id: NodeId,
    /// The aggregation request, identical for every node in the round
    pub request: AggregationRequest,
    /// Message timestamp
    pub timestamp: Timestamp,
}

impl QueryRequest {
    /// Create a new query for one node.
    pub fn new(round: u64, dst_node_id: NodeId, request: AggregationRequest) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            round,
            dst_node_id,
            request,
            timestamp: now(),
        }
    }
}

/// A node's reply: either its partial statistics or an error reason.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueryReply {
    /// Message ID
    pub id: String,
    /// Replying node
    pub node_id: NodeId,
    /// ID of the query this reply answers
    pub correlation_id: String,
    /// Round this reply belongs to
    pub round: u64,
    /// Partial statistics (for successful replies)
    pub payload: Option<PartialStatistics>,
    /// Failure reason (for error replies)
    pub error: Option<String>,
    /// Message timestamp
    pub timestamp: Timestamp,
}

impl QueryReply {
    /// Create a successful reply.
    pub fn ok(request: &QueryRequest, node_id: NodeId, payload: PartialStatistics) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            node_id,
            correlation_id: request.id.clone(),
            round: request.round,
            payload: Some(payload),
            error: None,
            timestamp: now(),
        }
    }

    /// Create an error reply.
    pub fn error(request: &QueryRequest, node_id: NodeId, reason: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            node_id,
            correlation_id: request.id.clone(),
            round: request.round,
            payload: None,
            error: Some(reason.to_string()),
            timestamp: now(),
        }
    }

    /// Whether the reply reports a node-local failure.
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Whether the reply can contribute to aggregation.
    ///
    /// A reply that claims success but carries no payload is malformed
    /// and contributes nothing.
    pub fn is_valid(&self) -> bool {
        self.error.is_none() && self.payload.is_some()
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to a compact binary frame.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize from a binary frame.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}
