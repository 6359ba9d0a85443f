//! # RPC Handlers
//!
//! Node-level service handlers registered on the dispatcher.

pub mod query;

pub use query::{register_query_service, AccountKey, ObjectId};
