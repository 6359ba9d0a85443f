//! Ports module for RPC dispatch
//!
//! Inbound port: the per-method service handler contract.

pub mod inbound;

pub use inbound::{handler_fn, FnHandler, ServiceHandler};
