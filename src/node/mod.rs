//! Node-side computation over private local data.
//!
//! Each node computes sufficient statistics independently; no cross-node
//! knowledge, shared memory, or locking is involved.

pub mod compute;
pub mod dataset;
pub mod service;

pub use compute::compute_partial_statistics;
pub use dataset::{Dataset, MemoryDataset};
pub use service::StatisticsNode;
