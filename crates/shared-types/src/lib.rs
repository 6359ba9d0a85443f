//! # Shared Types Crate
//!
//! Domain entities used across the node: signed transactions, ordered
//! proposals, and the read-only world-state query port consumed by RPC
//! handlers.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Cross-crate types are defined here.
//! - **Ports, not adapters**: The query API is a trait only; storage backends
//!   live outside this workspace.

pub mod entities;
pub mod errors;
pub mod query;

pub use entities::*;
pub use errors::*;
pub use query::{QueryApi, TransactionIter};
