//! # Node Runtime Library
//!
//! This library exposes the internal modules of the node runtime for testing.
//! The main entry point is the `main.rs` binary.
//!
//! ## Architectural Patterns
//!
//! - **Hexagonal Architecture**: Ports define contracts, Adapters implement them
//! - **Completion-queue RPC**: Every service is a method on one dispatcher
//! - **Weak back-links**: The ordering gate observes its PCS, never owns it

#![allow(clippy::type_complexity)]

pub mod adapters;
pub mod container;
pub mod handlers;
pub mod wiring;

pub use container::{load_config, NodeConfig, RejectedOverride};
pub use wiring::NodeRuntime;
