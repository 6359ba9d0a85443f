//! Call registry and completion-queue dispatch loop.
//!
//! The registry owns every live [`Call`], indexed by id, plus a map from each
//! armed tag to the call waiting on it. Workers pull completions off the
//! shared queue and resolve them against that map under one lock, so each
//! call's transitions happen atomically and each tag is consumed once.
//!
//! ## Invariants
//!
//! - On a request-received event the replacement call for the same method is
//!   armed before the lock is released, i.e. before the handler runs and
//!   before any worker sees another event.
//! - A call leaves the registry only after its send-completion event (or when
//!   it is discarded). Handlers never own it.
//! - Handlers run on their own tasks; workers never await them.

use crate::adapters::client::RpcClient;
use crate::adapters::completion_queue::{Completion, CompletionQueue};
use crate::application::responder::{CallContext, RawResponder};
use crate::config::DispatchConfig;
use crate::domain::call::{Call, CallId, CallState};
use crate::domain::errors::{CallError, DispatchError};
use crate::domain::method::MethodDescriptor;
use crate::domain::status::Status;
use crate::domain::tag::{Tag, TagAllocator, TagKind};
use crate::ports::inbound::{ErasedHandler, ServiceHandler, TypedHandler};
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// A call changed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleEvent {
    pub call_id: CallId,
    pub method: Arc<str>,
    pub state: CallState,
}

/// Dispatcher counters
#[derive(Debug, Default)]
pub struct DispatchStats {
    /// Requests handed to a handler
    pub requests_received: AtomicU64,
    /// Responses whose send completed
    pub responses_sent: AtomicU64,
    /// Calls released after a completed exchange
    pub calls_retired: AtomicU64,
    /// Calls dropped without a completed exchange
    pub calls_discarded: AtomicU64,
    /// Completions whose tag matched no live call
    pub stale_tags: AtomicU64,
    /// Events rejected by a call's state machine
    pub protocol_violations: AtomicU64,
}

/// Result of a finished dispatch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Completions processed across all workers
    pub completions_processed: u64,
    /// In-flight calls discarded after the queue drained
    pub discarded_at_shutdown: usize,
}

struct RegisteredMethod {
    name: Arc<str>,
    handler: Arc<dyn ErasedHandler>,
}

struct LiveCall {
    call: Call,
    method: Arc<RegisteredMethod>,
}

struct CallRegistry {
    calls: HashMap<CallId, LiveCall>,
    tags: HashMap<Tag, (CallId, TagKind)>,
    tag_alloc: TagAllocator,
    next_call_id: u64,
}

impl CallRegistry {
    fn new() -> Self {
        Self {
            calls: HashMap::new(),
            tags: HashMap::new(),
            tag_alloc: TagAllocator::new(),
            next_call_id: 1,
        }
    }

    fn allocate_call_id(&mut self) -> CallId {
        let id = CallId::from_raw(self.next_call_id);
        self.next_call_id += 1;
        id
    }
}

/// Work handed to a handler task once the registry lock is released.
struct HandlerWork {
    ctx: CallContext,
    handler: Arc<dyn ErasedHandler>,
    payload: Vec<u8>,
    responder: RawResponder,
}

/// Completion-queue dispatcher.
pub struct Dispatcher {
    config: DispatchConfig,
    queue: Arc<CompletionQueue>,
    methods: RwLock<HashMap<String, Arc<RegisteredMethod>>>,
    registry: Mutex<CallRegistry>,
    started: AtomicBool,
    stats: DispatchStats,
    lifecycle: broadcast::Sender<LifecycleEvent>,
}

impl Dispatcher {
    /// Create a dispatcher with its own completion queue.
    pub fn new(config: DispatchConfig) -> Self {
        let queue = Arc::new(CompletionQueue::new(config.max_backlog_per_method));
        let (lifecycle, _) = broadcast::channel(config.lifecycle_buffer.max(1));
        Self {
            config,
            queue,
            methods: RwLock::new(HashMap::new()),
            registry: Mutex::new(CallRegistry::new()),
            started: AtomicBool::new(false),
            stats: DispatchStats::default(),
            lifecycle,
        }
    }

    /// Bind a handler to a method and arm its first call.
    ///
    /// Must happen before [`Dispatcher::run`].
    pub fn register_method<Req, Resp, H>(
        &self,
        descriptor: MethodDescriptor<Req, Resp>,
        handler: H,
    ) -> Result<(), DispatchError>
    where
        Req: DeserializeOwned + Send + 'static,
        Resp: Serialize + Send + 'static,
        H: ServiceHandler<Req, Resp>,
    {
        if self.started.load(Ordering::Acquire) {
            return Err(DispatchError::AlreadyStarted);
        }

        let name = descriptor.name();
        let method = {
            let mut methods = self.methods.write();
            if methods.contains_key(name) {
                return Err(DispatchError::DuplicateMethod(name.to_string()));
            }
            let method = Arc::new(RegisteredMethod {
                name: Arc::from(name),
                handler: Arc::new(TypedHandler::<Req, Resp, H>::new(handler)),
            });
            methods.insert(name.to_string(), Arc::clone(&method));
            method
        };

        self.queue.add_method(name);
        let mut registry = self.registry.lock();
        let call_id = self.arm_call(&mut registry, &method)?;
        info!(method = name, %call_id, "[rpc] Method registered");
        Ok(())
    }

    /// Run the dispatch loop with the configured number of workers.
    ///
    /// Returns once the queue has been shut down and drained.
    pub async fn run(self: Arc<Self>) -> DispatchSummary {
        let workers = self.config.worker_count.max(1);
        self.started.store(true, Ordering::Release);
        info!(
            workers,
            methods = self.methods.read().len(),
            "[rpc] Dispatch loop starting"
        );

        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let dispatcher = Arc::clone(&self);
            handles.push(tokio::spawn(async move {
                dispatcher.worker_loop(worker_id).await
            }));
        }

        let mut processed = 0;
        for handle in handles {
            match handle.await {
                Ok(count) => processed += count,
                Err(e) => error!(error = %e, "[rpc] Dispatch worker failed"),
            }
        }

        let discarded = self.discard_remaining();
        info!(processed, discarded, "[rpc] Dispatch loop exited");
        DispatchSummary {
            completions_processed: processed,
            discarded_at_shutdown: discarded,
        }
    }

    /// Shut the completion queue down. `run` returns once it has drained.
    pub fn shutdown(&self) {
        info!("[rpc] Shutdown requested");
        self.queue.shutdown();
    }

    /// Client bound to this dispatcher's queue.
    pub fn client(&self) -> RpcClient {
        RpcClient::new(Arc::clone(&self.queue))
    }

    pub fn queue(&self) -> &Arc<CompletionQueue> {
        &self.queue
    }

    pub fn stats(&self) -> &DispatchStats {
        &self.stats
    }

    /// Observe call transitions.
    pub fn subscribe_lifecycle(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.lifecycle.subscribe()
    }

    pub fn registered_methods(&self) -> Vec<String> {
        let mut names: Vec<String> = self.methods.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Calls currently owned by the registry.
    pub fn live_calls(&self) -> usize {
        self.registry.lock().calls.len()
    }

    /// Calls of `method` armed and waiting for a request.
    pub fn listening_calls(&self, method: &str) -> usize {
        self.registry
            .lock()
            .calls
            .values()
            .filter(|live| {
                live.call.state() == CallState::AwaitingRequest && &*live.method.name == method
            })
            .count()
    }

    pub fn call_state(&self, call_id: CallId) -> Option<CallState> {
        self.registry
            .lock()
            .calls
            .get(&call_id)
            .map(|live| live.call.state())
    }

    async fn worker_loop(&self, worker_id: usize) -> u64 {
        debug!(worker_id, "[rpc] Worker started");
        let mut processed = 0;
        while let Some(completion) = self.queue.next().await {
            self.handle_completion(completion);
            processed += 1;
        }
        debug!(worker_id, processed, "[rpc] Worker drained queue");
        processed
    }

    /// Route one completion to the call owning its tag.
    fn handle_completion(&self, completion: Completion) {
        let work = {
            let mut registry = self.registry.lock();
            let Some((call_id, kind)) = registry.tags.remove(&completion.tag) else {
                self.stats.stale_tags.fetch_add(1, Ordering::Relaxed);
                warn!(
                    tag = %completion.tag,
                    ok = completion.ok,
                    "[rpc] Completion for unknown or retired call, ignoring"
                );
                return;
            };

            match kind {
                TagKind::RequestReceived => {
                    self.on_request_received(&mut registry, call_id, completion)
                }
                TagKind::ResponseSent => {
                    self.on_response_sent(&mut registry, call_id, completion.ok);
                    None
                }
            }
        };

        if let Some(work) = work {
            tokio::spawn(async move {
                let HandlerWork {
                    ctx,
                    handler,
                    payload,
                    responder,
                } = work;
                handler.dispatch(&ctx, payload, responder).await;
            });
        }
    }

    fn on_request_received(
        &self,
        registry: &mut CallRegistry,
        call_id: CallId,
        completion: Completion,
    ) -> Option<HandlerWork> {
        let Some(mut live) = registry.calls.remove(&call_id) else {
            warn!(%call_id, "[rpc] Tag resolved to a call missing from the registry");
            return None;
        };
        let method = Arc::clone(&live.method);

        if !completion.ok {
            self.discard(&mut live.call, "request was not received");
            self.rearm_if_live(registry, &method);
            return None;
        }

        if self.queue.is_shutdown() {
            if let Some(request) = self.queue.take_request(completion.tag) {
                let _ = request
                    .reply
                    .send(Err(Status::unavailable("server is shutting down")));
            }
            self.discard(&mut live.call, "queue shutting down");
            return None;
        }

        let response_tag = match live.call.on_request_received() {
            Ok(tag) => tag,
            Err(e) => {
                self.protocol_violation(&mut live.call, &e);
                self.rearm_if_live(registry, &method);
                return None;
            }
        };
        self.emit(&live.call);

        let Some(request) = self.queue.take_request(completion.tag) else {
            let e = CallError::ProtocolViolation {
                call_id,
                state: live.call.state(),
                event: "take_request",
            };
            self.protocol_violation(&mut live.call, &e);
            self.rearm_if_live(registry, &method);
            return None;
        };

        self.stats.requests_received.fetch_add(1, Ordering::Relaxed);
        registry
            .tags
            .insert(response_tag, (call_id, TagKind::ResponseSent));
        registry.calls.insert(call_id, live);

        self.rearm_if_live(registry, &method);

        Some(HandlerWork {
            ctx: CallContext::new(call_id, Arc::clone(&method.name)),
            handler: Arc::clone(&method.handler),
            payload: request.payload,
            responder: RawResponder::new(
                call_id,
                response_tag,
                request.reply,
                Arc::clone(&self.queue),
            ),
        })
    }

    fn on_response_sent(&self, registry: &mut CallRegistry, call_id: CallId, ok: bool) {
        let Some(mut live) = registry.calls.remove(&call_id) else {
            warn!(%call_id, "[rpc] Tag resolved to a call missing from the registry");
            return;
        };

        if !ok {
            self.discard(&mut live.call, "response could not be delivered");
            return;
        }

        if let Err(e) = live.call.on_response_sent() {
            self.protocol_violation(&mut live.call, &e);
            return;
        }
        self.emit(&live.call);
        self.stats.responses_sent.fetch_add(1, Ordering::Relaxed);

        if let Err(e) = live.call.retire() {
            self.protocol_violation(&mut live.call, &e);
            return;
        }
        self.emit(&live.call);
        self.stats.calls_retired.fetch_add(1, Ordering::Relaxed);
        debug!(%call_id, method = %live.method.name, "[rpc] Call retired");
    }

    /// Create a call for `method`, register its request tag and arm it on the queue.
    fn arm_call(
        &self,
        registry: &mut CallRegistry,
        method: &Arc<RegisteredMethod>,
    ) -> Result<CallId, DispatchError> {
        let call_id = registry.allocate_call_id();
        let request_tag = registry.tag_alloc.allocate();
        let response_tag = registry.tag_alloc.allocate();
        let mut call = Call::new(call_id, Arc::clone(&method.name), request_tag, response_tag);
        self.emit(&call);

        let request_tag = call.arm()?;
        self.emit(&call);

        if let Err(e) = self.queue.request_call(&method.name, request_tag) {
            self.discard(&mut call, "queue refused to arm");
            return Err(e);
        }

        registry
            .tags
            .insert(request_tag, (call_id, TagKind::RequestReceived));
        registry.calls.insert(
            call_id,
            LiveCall {
                call,
                method: Arc::clone(method),
            },
        );
        Ok(call_id)
    }

    fn rearm_if_live(&self, registry: &mut CallRegistry, method: &Arc<RegisteredMethod>) {
        if self.queue.is_shutdown() {
            debug!(method = %method.name, "[rpc] Queue shut down, not re-arming");
            return;
        }
        match self.arm_call(registry, method) {
            Ok(call_id) => debug!(method = %method.name, %call_id, "[rpc] Replacement call armed"),
            Err(e) => warn!(method = %method.name, error = %e, "[rpc] Failed to re-arm method"),
        }
    }

    fn discard(&self, call: &mut Call, reason: &'static str) {
        if call.discard().is_err() {
            return;
        }
        self.stats.calls_discarded.fetch_add(1, Ordering::Relaxed);
        self.emit(call);
        warn!(call_id = %call.id(), method = %call.method(), reason, "[rpc] Call discarded");
    }

    fn protocol_violation(&self, call: &mut Call, err: &CallError) {
        self.stats.protocol_violations.fetch_add(1, Ordering::Relaxed);
        error!(error = %err, "[rpc] Protocol violation");
        self.discard(call, "protocol violation");
    }

    /// Discard every call still in the registry once no worker is running.
    fn discard_remaining(&self) -> usize {
        let mut registry = self.registry.lock();
        registry.tags.clear();
        let remaining: Vec<LiveCall> = registry.calls.drain().map(|(_, live)| live).collect();
        let count = remaining.len();
        for mut live in remaining {
            self.discard(&mut live.call, "dispatcher stopped");
        }
        count
    }

    fn emit(&self, call: &Call) {
        debug!(
            call_id = %call.id(),
            method = %call.method(),
            state = ?call.state(),
            "[rpc] Call transition"
        );
        let _ = self.lifecycle.send(LifecycleEvent {
            call_id: call.id(),
            method: Arc::clone(call.method()),
            state: call.state(),
        });
    }
}
