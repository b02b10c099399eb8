//! Wire-level types for the federated statistics protocol.
//!
//! Requests, sufficient-statistics payloads, message envelopes, and the
//! exchange seam the coordinator drives them through.

pub mod exchange;
pub mod message;
pub mod request;
pub mod stats;

pub use exchange::{LocalExchange, MessageExchange, QueryHandler};
pub use message::{QueryReply, QueryRequest};
pub use request::{AggregationMethod, AggregationRequest};
pub use stats::{PartialStat, PartialStatistics};
