//! # Node Container
//!
//! Configuration for every component the runtime wires together.

pub mod config;

pub use config::{load_config, ConfigError, NodeConfig, RejectedOverride};
