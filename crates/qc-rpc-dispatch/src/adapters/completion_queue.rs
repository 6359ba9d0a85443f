//! In-process completion queue.
//!
//! Stands in for the network transport. Servers arm request tags per method;
//! clients start calls; the queue matches the two and reports a
//! [`Completion`] for the armed tag. Responses are finished against a
//! response tag, which is reported once the reply has been handed to the
//! client.
//!
//! Every completion is delivered to exactly one consumer: all workers share
//! one receiver behind an async mutex.
//!
//! ## Shutdown
//!
//! `shutdown()` completes every still-armed request tag with `ok = false`,
//! fails queued client requests with `UNAVAILABLE`, and closes the channel.
//! Consumers drain what is left and then see `None`.

use crate::domain::errors::DispatchError;
use crate::domain::status::Status;
use crate::domain::tag::Tag;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Reply delivered to the client: encoded response or error status.
pub type RpcReply = Result<Vec<u8>, Status>;

/// A finished asynchronous operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    /// Tag the operation was armed with.
    pub tag: Tag,
    /// False when the operation did not complete normally
    /// (queue shutdown, peer went away).
    pub ok: bool,
}

/// A client request matched to (or waiting for) a server call.
#[derive(Debug)]
pub struct InboundRequest {
    pub method: String,
    pub payload: Vec<u8>,
    pub reply: oneshot::Sender<RpcReply>,
}

#[derive(Default)]
struct QueueState {
    sender: Option<mpsc::UnboundedSender<Completion>>,
    methods: HashSet<String>,
    /// Armed request tags per method, oldest first.
    listeners: HashMap<String, VecDeque<Tag>>,
    /// Client requests waiting for a call to arm, per method.
    backlog: HashMap<String, VecDeque<InboundRequest>>,
    /// Requests matched to a tag, waiting to be taken by the dispatcher.
    matched: HashMap<Tag, InboundRequest>,
}

impl QueueState {
    fn post(&self, completion: Completion) -> bool {
        match &self.sender {
            Some(sender) => sender.send(completion).is_ok(),
            None => false,
        }
    }
}

/// Shared completion queue.
pub struct CompletionQueue {
    state: Mutex<QueueState>,
    receiver: tokio::sync::Mutex<mpsc::UnboundedReceiver<Completion>>,
    max_backlog: usize,
}

impl CompletionQueue {
    /// Create a queue allowing `max_backlog` waiting requests per method.
    pub fn new(max_backlog: usize) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            state: Mutex::new(QueueState {
                sender: Some(sender),
                ..QueueState::default()
            }),
            receiver: tokio::sync::Mutex::new(receiver),
            max_backlog,
        }
    }

    /// Declare a method as served. Calls to undeclared methods fail with
    /// `UNIMPLEMENTED`.
    pub fn add_method(&self, method: &str) {
        self.state.lock().methods.insert(method.to_string());
    }

    /// Arm `tag` to receive the next request for `method`.
    ///
    /// If a client request is already waiting it is matched immediately and
    /// the completion is posted.
    pub fn request_call(&self, method: &str, tag: Tag) -> Result<(), DispatchError> {
        let mut state = self.state.lock();
        if state.sender.is_none() {
            return Err(DispatchError::QueueShutdown);
        }

        let waiting = state
            .backlog
            .get_mut(method)
            .and_then(|queue| queue.pop_front());

        match waiting {
            Some(request) => {
                state.matched.insert(tag, request);
                state.post(Completion { tag, ok: true });
                debug!(method = method, %tag, "Armed call matched backlogged request");
            }
            None => {
                state
                    .listeners
                    .entry(method.to_string())
                    .or_default()
                    .push_back(tag);
            }
        }
        Ok(())
    }

    /// Client side: start a call. The returned receiver yields the reply.
    pub fn start_call(&self, method: &str, payload: Vec<u8>) -> oneshot::Receiver<RpcReply> {
        let (reply, rx) = oneshot::channel();
        let mut state = self.state.lock();

        if state.sender.is_none() {
            let _ = reply.send(Err(Status::unavailable("server is shutting down")));
            return rx;
        }
        if !state.methods.contains(method) {
            let _ = reply.send(Err(Status::unimplemented(format!(
                "unknown method {method}"
            ))));
            return rx;
        }

        let request = InboundRequest {
            method: method.to_string(),
            payload,
            reply,
        };

        let listener = state
            .listeners
            .get_mut(method)
            .and_then(|tags| tags.pop_front());

        match listener {
            Some(tag) => {
                state.matched.insert(tag, request);
                state.post(Completion { tag, ok: true });
            }
            None => {
                let max_backlog = self.max_backlog;
                let backlog = state.backlog.entry(method.to_string()).or_default();
                if backlog.len() >= max_backlog {
                    warn!(method = method, max_backlog, "Request backlog full, rejecting call");
                    let _ = request.reply.send(Err(Status::resource_exhausted(format!(
                        "backlog for {method} is full"
                    ))));
                } else {
                    backlog.push_back(request);
                    debug!(method = method, waiting = backlog.len(), "No armed call, request queued");
                }
            }
        }
        rx
    }

    /// Abandon an armed request tag, as the transport does when the
    /// listening stream is reset. The tag completes with `ok = false`.
    ///
    /// Returns false if `tag` was not armed for `method`.
    pub fn cancel_call(&self, method: &str, tag: Tag) -> bool {
        let mut state = self.state.lock();
        let Some(listeners) = state.listeners.get_mut(method) else {
            return false;
        };
        let Some(position) = listeners.iter().position(|armed| *armed == tag) else {
            return false;
        };
        listeners.remove(position);
        debug!(method = method, %tag, "Armed call cancelled by transport");
        state.post(Completion { tag, ok: false })
    }

    /// Take the request matched to `tag`. Each matched request is taken once.
    pub fn take_request(&self, tag: Tag) -> Option<InboundRequest> {
        self.state.lock().matched.remove(&tag)
    }

    /// Deliver a reply and report `tag` as completed.
    ///
    /// `ok` is false when the client is no longer waiting. Returns whether the
    /// completion could be posted (false after shutdown).
    pub fn finish(&self, tag: Tag, reply: oneshot::Sender<RpcReply>, response: RpcReply) -> bool {
        let delivered = reply.send(response).is_ok();
        let posted = self.post(Completion {
            tag,
            ok: delivered,
        });
        if !posted {
            debug!(%tag, delivered, "Response finished after queue shutdown");
        }
        posted
    }

    /// Post a raw completion. Returns false after shutdown.
    pub fn post(&self, completion: Completion) -> bool {
        self.state.lock().post(completion)
    }

    /// Next completion, or `None` once the queue is shut down and drained.
    pub async fn next(&self) -> Option<Completion> {
        self.receiver.lock().await.recv().await
    }

    pub fn is_shutdown(&self) -> bool {
        self.state.lock().sender.is_none()
    }

    /// Number of armed request tags for `method`.
    pub fn armed_count(&self, method: &str) -> usize {
        self.state
            .lock()
            .listeners
            .get(method)
            .map_or(0, VecDeque::len)
    }

    /// Number of client requests waiting for `method`.
    pub fn backlog_len(&self, method: &str) -> usize {
        self.state
            .lock()
            .backlog
            .get(method)
            .map_or(0, VecDeque::len)
    }

    /// Stop accepting operations. Idempotent.
    pub fn shutdown(&self) {
        let mut state = self.state.lock();
        if state.sender.is_none() {
            return;
        }

        let listeners = std::mem::take(&mut state.listeners);
        let mut cancelled = 0usize;
        for tag in listeners.into_values().flatten() {
            state.post(Completion { tag, ok: false });
            cancelled += 1;
        }

        let backlog = std::mem::take(&mut state.backlog);
        let mut rejected = 0usize;
        for request in backlog.into_values().flatten() {
            let _ = request
                .reply
                .send(Err(Status::unavailable("server is shutting down")));
            rejected += 1;
        }

        state.sender = None;
        info!(
            cancelled_listeners = cancelled,
            rejected_requests = rejected,
            "Completion queue shut down"
        );
    }
}
