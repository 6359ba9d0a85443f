//! Handler-facing view of a call: a borrowed context plus a single-use
//! response capability.

use crate::adapters::completion_queue::{CompletionQueue, RpcReply};
use crate::domain::call::CallId;
use crate::domain::codec;
use crate::domain::status::Status;
use crate::domain::tag::Tag;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Read-only facts about the call being handled.
#[derive(Debug, Clone)]
pub struct CallContext {
    call_id: CallId,
    method: Arc<str>,
    received_at: Instant,
}

impl CallContext {
    pub(crate) fn new(call_id: CallId, method: Arc<str>) -> Self {
        Self {
            call_id,
            method,
            received_at: Instant::now(),
        }
    }

    pub fn call_id(&self) -> CallId {
        self.call_id
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Time since the request was matched.
    pub fn elapsed(&self) -> Duration {
        self.received_at.elapsed()
    }
}

/// Untyped half of a responder: where the reply goes and which tag to report.
pub(crate) struct RawResponder {
    call_id: CallId,
    tag: Tag,
    reply: oneshot::Sender<RpcReply>,
    queue: Arc<CompletionQueue>,
}

impl RawResponder {
    pub(crate) fn new(
        call_id: CallId,
        tag: Tag,
        reply: oneshot::Sender<RpcReply>,
        queue: Arc<CompletionQueue>,
    ) -> Self {
        Self {
            call_id,
            tag,
            reply,
            queue,
        }
    }

    fn finish(self, response: RpcReply) {
        debug!(call_id = %self.call_id, tag = %self.tag, ok = response.is_ok(), "Response queued");
        self.queue.finish(self.tag, self.reply, response);
    }
}

/// Capability to answer one call, exactly once.
///
/// Sending consumes the responder, so a second response cannot be expressed.
/// Dropping it unsent answers the call with `INTERNAL` so the call still goes
/// through its normal send-completion path.
pub struct Responder<Resp> {
    raw: Option<RawResponder>,
    _types: PhantomData<fn(Resp)>,
}

impl<Resp> Responder<Resp> {
    pub(crate) fn new(raw: RawResponder) -> Self {
        Self {
            raw: Some(raw),
            _types: PhantomData,
        }
    }
}

impl<Resp: Serialize> Responder<Resp> {
    /// Respond successfully.
    pub fn send(self, response: Resp) {
        self.send_result(Ok(response));
    }

    /// Respond with an error status.
    pub fn send_error(self, status: Status) {
        self.send_result(Err(status));
    }

    /// Respond with either a payload or an error status.
    pub fn send_result(mut self, result: Result<Resp, Status>) {
        let Some(raw) = self.raw.take() else {
            return;
        };
        let reply = match result {
            Ok(response) => codec::encode(&response).map_err(|e| Status::internal(e.to_string())),
            Err(status) => Err(status),
        };
        raw.finish(reply);
    }
}

impl<Resp> Drop for Responder<Resp> {
    fn drop(&mut self) {
        if let Some(raw) = self.raw.take() {
            warn!(call_id = %raw.call_id, "Handler finished without responding");
            raw.finish(Err(Status::internal("handler finished without responding")));
        }
    }
}
