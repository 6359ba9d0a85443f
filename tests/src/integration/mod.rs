//! # Integration Tests
//!
//! Flows that cross crate boundaries: dispatcher + handlers, gate + PCS,
//! and full node runtimes talking over RPC.

pub mod dispatch;
pub mod ordering;
