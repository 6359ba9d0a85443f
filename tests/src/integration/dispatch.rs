//! # Dispatch Flow Tests
//!
//! Drives the dispatcher through its public API only:
//!
//! ```text
//! RpcClient ──→ CompletionQueue ──→ Dispatcher ──→ ServiceHandler
//!     ↑                                                  │
//!     └──────────────────── Responder ───────────────────┘
//! ```
//!
//! ## Test Categories
//!
//! 1. **Happy Path**: unary echo, full lifecycle of one call
//! 2. **Error Paths**: unknown method, full backlog
//! 3. **Shutdown**: outstanding calls are discarded and the loop exits

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use qc_rpc_dispatch::{
        handler_fn, CallContext, CallId, CallState, DispatchConfig, DispatchSummary, Dispatcher,
        LifecycleEvent, MethodDescriptor, Responder, ServiceHandler, Status, StatusCode,
    };
    use serde::{Deserialize, Serialize};
    use tokio::sync::{broadcast, Semaphore};
    use tokio::task::JoinHandle;
    use tokio::time::timeout;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct Ping {
        seq: u32,
        body: String,
    }

    const ECHO: MethodDescriptor<Ping, Ping> = MethodDescriptor::new("test.Echo");
    const SLOW: MethodDescriptor<Ping, Ping> = MethodDescriptor::new("test.Slow");
    const MISSING: MethodDescriptor<Ping, Ping> = MethodDescriptor::new("test.Missing");

    /// Handler that answers only once a permit is released
    struct SlowEcho {
        permits: Arc<Semaphore>,
    }

    #[async_trait]
    impl ServiceHandler<Ping, Ping> for SlowEcho {
        async fn handle(&self, _ctx: &CallContext, request: Ping, responder: Responder<Ping>) {
            if let Ok(permit) = self.permits.acquire().await {
                permit.forget();
            }
            responder.send(request);
        }
    }

    fn echo_server(config: DispatchConfig) -> Arc<Dispatcher> {
        let dispatcher = Arc::new(Dispatcher::new(config));
        dispatcher
            .register_method(
                ECHO,
                handler_fn(|ping: Ping| async move { Ok::<_, Status>(ping) }),
            )
            .unwrap();
        dispatcher
    }

    fn run(dispatcher: &Arc<Dispatcher>) -> JoinHandle<DispatchSummary> {
        tokio::spawn(Arc::clone(dispatcher).run())
    }

    async fn eventually(mut condition: impl FnMut() -> bool) {
        timeout(Duration::from_secs(5), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    fn collect(rx: &mut broadcast::Receiver<LifecycleEvent>) -> BTreeMap<CallId, Vec<CallState>> {
        let mut per_call: BTreeMap<CallId, Vec<CallState>> = BTreeMap::new();
        while let Ok(event) = rx.try_recv() {
            per_call.entry(event.call_id).or_default().push(event.state);
        }
        per_call
    }

    // =============================================================================
    // HAPPY PATH
    // =============================================================================

    /// One echo call walks the full lifecycle and a replacement is left listening
    #[tokio::test]
    async fn test_echo_call_full_lifecycle() {
        let dispatcher = echo_server(DispatchConfig::default());
        let mut lifecycle = dispatcher.subscribe_lifecycle();
        let handle = run(&dispatcher);

        let ping = Ping {
            seq: 1,
            body: "x".into(),
        };
        let pong = dispatcher.client().call(&ECHO, &ping).await.unwrap();
        assert_eq!(pong, ping);

        eventually(|| {
            dispatcher.stats().calls_retired.load(Ordering::Relaxed) == 1
        })
        .await;

        let per_call = collect(&mut lifecycle);
        let served: Vec<&Vec<CallState>> = per_call
            .values()
            .filter(|states| states.contains(&CallState::Retired))
            .collect();
        assert_eq!(served.len(), 1);
        assert_eq!(
            *served[0],
            vec![
                CallState::Created,
                CallState::AwaitingRequest,
                CallState::RequestReceived,
                CallState::ResponseSent,
                CallState::Retired,
            ]
        );
        assert_eq!(dispatcher.listening_calls("test.Echo"), 1);

        dispatcher.shutdown();
        timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
    }

    /// Requests sent before the loop starts are queued and served once it runs
    #[tokio::test]
    async fn test_requests_before_start_are_served() {
        let dispatcher = echo_server(DispatchConfig::default());
        let client = dispatcher.client();

        let early: Vec<_> = (0..3)
            .map(|seq| {
                let client = client.clone();
                tokio::spawn(async move {
                    client
                        .call(&ECHO, &Ping { seq, body: String::new() })
                        .await
                })
            })
            .collect();

        let handle = run(&dispatcher);
        for (seq, call) in early.into_iter().enumerate() {
            let pong = timeout(Duration::from_secs(5), call).await.unwrap().unwrap().unwrap();
            assert_eq!(pong.seq, seq as u32);
        }

        dispatcher.shutdown();
        timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
    }

    // =============================================================================
    // ERROR PATHS
    // =============================================================================

    #[tokio::test]
    async fn test_unknown_method_is_unimplemented() {
        let dispatcher = echo_server(DispatchConfig::default());
        let handle = run(&dispatcher);

        let status = dispatcher
            .client()
            .call(&MISSING, &Ping { seq: 0, body: String::new() })
            .await
            .unwrap_err();
        assert_eq!(status.code, StatusCode::Unimplemented);

        dispatcher.shutdown();
        timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
    }

    /// With no worker running, one request takes the armed call, the next
    /// fills the backlog and the third is refused
    #[tokio::test]
    async fn test_full_backlog_is_resource_exhausted() {
        let dispatcher = echo_server(DispatchConfig {
            max_backlog_per_method: 1,
            ..DispatchConfig::default()
        });
        let client = dispatcher.client();
        let queue = Arc::clone(dispatcher.queue());

        let spawn_call = |seq: u32| {
            let client = client.clone();
            tokio::spawn(async move { client.call(&ECHO, &Ping { seq, body: String::new() }).await })
        };

        let first = spawn_call(0);
        eventually(|| queue.armed_count("test.Echo") == 0).await;
        let second = spawn_call(1);
        eventually(|| queue.backlog_len("test.Echo") == 1).await;

        let status = client
            .call(&ECHO, &Ping { seq: 2, body: String::new() })
            .await
            .unwrap_err();
        assert_eq!(status.code, StatusCode::ResourceExhausted);

        let handle = run(&dispatcher);
        for call in [first, second] {
            assert!(timeout(Duration::from_secs(5), call).await.unwrap().unwrap().is_ok());
        }

        dispatcher.shutdown();
        timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
    }

    // =============================================================================
    // SHUTDOWN
    // =============================================================================

    /// Three calls still inside their handler when the queue shuts down
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_shutdown_with_outstanding_calls() {
        let dispatcher = Arc::new(Dispatcher::new(DispatchConfig {
            worker_count: 3,
            ..DispatchConfig::default()
        }));
        let permits = Arc::new(Semaphore::new(0));
        dispatcher
            .register_method(SLOW, SlowEcho { permits: Arc::clone(&permits) })
            .unwrap();
        let mut lifecycle = dispatcher.subscribe_lifecycle();
        let handle = run(&dispatcher);

        let clients: Vec<_> = (0..3)
            .map(|seq| {
                let client = dispatcher.client();
                tokio::spawn(async move {
                    client.call(&SLOW, &Ping { seq, body: String::new() }).await
                })
            })
            .collect();
        eventually(|| {
            dispatcher.stats().requests_received.load(Ordering::Relaxed) == 3
        })
        .await;

        dispatcher.shutdown();
        let summary = timeout(Duration::from_secs(5), handle)
            .await
            .expect("dispatch loop did not exit")
            .unwrap();
        assert_eq!(summary.discarded_at_shutdown, 3);
        assert_eq!(dispatcher.live_calls(), 0);

        // Every call ever created ended in a terminal state.
        for (call_id, states) in collect(&mut lifecycle) {
            let last = states.last().copied().unwrap();
            assert!(last.is_terminal(), "{call_id} ended in {last:?}");
        }

        permits.add_permits(3);
        for client in clients {
            let _ = timeout(Duration::from_secs(5), client).await.unwrap().unwrap();
        }
    }
}
