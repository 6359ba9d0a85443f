//! Error types for RPC dispatch

use crate::domain::call::{CallId, CallState};
use thiserror::Error;

/// Errors from dispatcher setup and control.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// Methods must be registered before the dispatch loop starts.
    #[error("Dispatcher already started; register methods before run()")]
    AlreadyStarted,

    /// A handler is already bound to this method.
    #[error("Method already registered: {0}")]
    DuplicateMethod(String),

    /// The completion queue no longer accepts operations.
    #[error("Completion queue is shutting down")]
    QueueShutdown,

    /// A freshly created call refused to arm.
    #[error(transparent)]
    Call(#[from] CallError),
}

/// Errors in a single call's lifecycle. Fatal to that call only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// An event arrived that the call's current state does not allow.
    #[error("Protocol violation on {call_id}: {event} in state {state:?}")]
    ProtocolViolation {
        call_id: CallId,
        state: CallState,
        event: &'static str,
    },
}

/// Payload encoding errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("Failed to encode payload: {0}")]
    Encode(String),

    #[error("Failed to decode payload: {0}")]
    Decode(String),
}
