//! Adapters: in-process transport for the dispatcher.

pub mod client;
pub mod completion_queue;

pub use client::RpcClient;
pub use completion_queue::{Completion, CompletionQueue, InboundRequest, RpcReply};
