//! # fedstats - Federated Statistics Aggregation
//!
//! A federated analytics engine computing exact global statistics over
//! data that never leaves its owners:
//! - **protocol**: requests, sufficient-statistics payloads, and the
//!   message exchange seam
//! - **node**: per-node partial statistics over a private local dataset
//! - **coordinator**: node sampling, round dispatch, and the reduction
//!   that reconstructs global mean / standard deviation from partials
//!
//! Only fixed-size sufficient statistics (sum, count, sum of squares)
//! cross the network; the reduction sums them and derives the aggregates
//! from the totals.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fedstats::coordinator::{Coordinator, RoundConfig};
//! use fedstats::core::NodeId;
//! use fedstats::node::{MemoryDataset, StatisticsNode};
//! use fedstats::protocol::LocalExchange;
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let exchange = LocalExchange::new();
//!     let dataset = MemoryDataset::new().with_column("age", vec![21.0, 34.0, 45.0]);
//!     exchange.register(
//!         NodeId::new(1),
//!         Arc::new(StatisticsNode::new(NodeId::new(1), dataset)),
//!     );
//!
//!     let config = RoundConfig::new(1.0, 1)
//!         .with_features(["age"])
//!         .with_methods(["mean", "std"]);
//!     let mut coordinator = Coordinator::new(exchange, config, StdRng::seed_from_u64(0))?;
//!
//!     let outcome = coordinator.run_round().await?;
//!     println!("{}", outcome.statistics.to_json_pretty()?);
//!     Ok(())
//! }
//! ```

pub mod coordinator;
pub mod core;
pub mod node;
pub mod protocol;
pub mod telemetry;

pub use crate::core::error::{Error, Result};
