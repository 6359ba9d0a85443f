//! Application layer for the Ordering Gate

pub mod service;
pub mod stream;

pub use service::{GateStats, OrderingGateService};
pub use stream::ProposalStream;
