//! # Adapter Implementations
//!
//! Concrete implementations of the ports the runtime wires together.
//!
//! - `BatchingPcs`: this node's `PeerCommunicationService`, a FIFO batcher
//!   feeding the ordering gate
//! - `InMemoryWorldState`: `QueryApi` backend for the query handlers

pub mod batching_pcs;
pub mod world_state;

pub use batching_pcs::{BatchingConfig, BatchingPcs};
pub use world_state::InMemoryWorldState;
