//! Call lifecycle state machine.
//!
//! ```text
//! Created ──arm──→ AwaitingRequest ──request tag──→ RequestReceived
//!                                                        │
//!                                              response tag
//!                                                        ↓
//!                          Retired ←──retire── ResponseSent
//!
//! any non-terminal state ──discard──→ Discarded
//! ```
//!
//! Each tag is consumed exactly once. A transition requested from the wrong
//! state is a protocol violation and leaves the call untouched so the
//! dispatcher can discard it.

use crate::domain::errors::CallError;
use crate::domain::tag::Tag;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Identity of a call within one dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(u64);

impl CallId {
    /// Wrap a raw call id.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw call id.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "call#{}", self.0)
    }
}

/// Lifecycle state of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallState {
    /// Allocated, not yet listening.
    Created,
    /// Listening for a request on the queue.
    AwaitingRequest,
    /// Request matched and handed to the service handler.
    RequestReceived,
    /// The queue reported the response as sent.
    ResponseSent,
    /// Released by the dispatcher after a completed exchange.
    Retired,
    /// Dropped without a completed exchange (transport failure, shutdown,
    /// protocol violation).
    Discarded,
}

impl CallState {
    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CallState::Retired | CallState::Discarded)
    }
}

/// One asynchronous remote invocation.
#[derive(Debug)]
pub struct Call {
    id: CallId,
    method: Arc<str>,
    state: CallState,
    request_tag: Tag,
    response_tag: Tag,
}

impl Call {
    /// Create a call with its two tags already allocated.
    pub fn new(id: CallId, method: Arc<str>, request_tag: Tag, response_tag: Tag) -> Self {
        debug_assert_ne!(request_tag, response_tag);
        Self {
            id,
            method,
            state: CallState::Created,
            request_tag,
            response_tag,
        }
    }

    pub fn id(&self) -> CallId {
        self.id
    }

    pub fn method(&self) -> &Arc<str> {
        &self.method
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    pub fn request_tag(&self) -> Tag {
        self.request_tag
    }

    pub fn response_tag(&self) -> Tag {
        self.response_tag
    }

    /// The single tag this call is currently waiting on, if any.
    pub fn outstanding_tag(&self) -> Option<Tag> {
        match self.state {
            CallState::AwaitingRequest => Some(self.request_tag),
            CallState::RequestReceived => Some(self.response_tag),
            _ => None,
        }
    }

    /// Start listening. Returns the request tag to arm on the queue.
    pub fn arm(&mut self) -> Result<Tag, CallError> {
        self.transition(CallState::Created, CallState::AwaitingRequest, "arm")?;
        Ok(self.request_tag)
    }

    /// The queue matched a request. Returns the response tag to arm.
    pub fn on_request_received(&mut self) -> Result<Tag, CallError> {
        self.transition(
            CallState::AwaitingRequest,
            CallState::RequestReceived,
            "request_received",
        )?;
        Ok(self.response_tag)
    }

    /// The queue reported the response as sent.
    pub fn on_response_sent(&mut self) -> Result<(), CallError> {
        self.transition(
            CallState::RequestReceived,
            CallState::ResponseSent,
            "response_sent",
        )
    }

    /// Release after a completed exchange.
    pub fn retire(&mut self) -> Result<(), CallError> {
        self.transition(CallState::ResponseSent, CallState::Retired, "retire")
    }

    /// Drop the call from whatever non-terminal state it is in.
    pub fn discard(&mut self) -> Result<(), CallError> {
        if self.state.is_terminal() {
            return Err(self.violation("discard"));
        }
        self.state = CallState::Discarded;
        Ok(())
    }

    fn transition(
        &mut self,
        from: CallState,
        to: CallState,
        event: &'static str,
    ) -> Result<(), CallError> {
        if self.state != from {
            return Err(self.violation(event));
        }
        self.state = to;
        Ok(())
    }

    fn violation(&self, event: &'static str) -> CallError {
        CallError::ProtocolViolation {
            call_id: self.id,
            state: self.state,
            event,
        }
    }
}
