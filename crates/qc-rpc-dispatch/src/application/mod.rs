//! Application layer: the dispatcher and the handler-facing responder.

pub mod dispatcher;
pub mod responder;

pub use dispatcher::{DispatchStats, DispatchSummary, Dispatcher, LifecycleEvent};
pub use responder::{CallContext, Responder};
