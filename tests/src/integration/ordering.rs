//! # Ordering Gate Flow Tests
//!
//! Two nodes, one ordering pipeline:
//!
//! ```text
//! Node A                                   Node B
//! ──────                                   ──────
//! OrderingGateService                      NodeRuntime
//!   │ propagate_transaction                  │
//!   ↓                                        │
//! RemoteOrderingPcs ──SubmitTransaction──→ BatchingPcs
//!                                            │ Proposal
//!                                            ↓
//!   ↑                                      OrderingGateService
//!   │                                        │ on_proposal
//!   └────────────PushProposal─────────── forwarder
//! ```

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use node_runtime::{NodeConfig, NodeRuntime};
    use qc_12_ordering_gate::{
        register_proposal_sink, DeliveryError, GateState, OrderingGate, OrderingGateService,
        PcsError, PeerCommunicationService, PushProposalRequest, RemoteOrderingPcs,
        PUSH_PROPOSAL,
    };
    use qc_rpc_dispatch::{DispatchConfig, Dispatcher};
    use shared_types::SignedTransaction;
    use tokio::time::timeout;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn tx(counter: u64) -> Arc<SignedTransaction> {
        Arc::new(SignedTransaction {
            creator: [9; 32],
            created_ts: 1_700_000_000_000,
            tx_counter: counter,
            payload: counter.to_le_bytes().to_vec(),
            signature: [0; 64],
        })
    }

    /// PCS that only counts what it is handed
    #[derive(Default)]
    struct CountingPcs {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PeerCommunicationService for CountingPcs {
        async fn propagate_transaction(
            &self,
            _transaction: Arc<SignedTransaction>,
        ) -> Result<(), PcsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn node_config(batch: usize) -> NodeConfig {
        let mut config = NodeConfig::default();
        config.batching.max_batch_size = batch;
        config.batching.batch_interval_ms = 60_000;
        config
    }

    // =============================================================================
    // WIRING
    // =============================================================================

    #[tokio::test]
    async fn test_unwired_gate_reports_not_wired() {
        let gate = OrderingGateService::new();
        let result = gate.propagate_transaction(tx(1)).await;
        assert!(matches!(result, Err(DeliveryError::NotWired)));
        assert_eq!(gate.state(), GateState::Unwired);
    }

    /// The second `set_pcs` is ignored and traffic keeps going to the first
    #[tokio::test]
    async fn test_set_pcs_twice_keeps_first() {
        let gate = OrderingGateService::new();
        let first = Arc::new(CountingPcs::default());
        let second = Arc::new(CountingPcs::default());
        let first_port: Arc<dyn PeerCommunicationService> = first.clone();
        let second_port: Arc<dyn PeerCommunicationService> = second.clone();

        assert!(gate.set_pcs(Arc::downgrade(&first_port)));
        assert!(!gate.set_pcs(Arc::downgrade(&second_port)));

        gate.propagate_transaction(tx(1)).await.unwrap();
        assert_eq!(first.calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.calls.load(Ordering::SeqCst), 0);
    }

    /// The gate never keeps its PCS alive
    #[tokio::test]
    async fn test_dropped_pcs_is_unavailable() {
        let gate = OrderingGateService::new();
        let pcs: Arc<dyn PeerCommunicationService> = Arc::new(CountingPcs::default());
        gate.set_pcs(Arc::downgrade(&pcs));
        drop(pcs);

        let result = gate.propagate_transaction(tx(1)).await;
        assert!(matches!(result, Err(DeliveryError::PcsUnavailable)));
    }

    // =============================================================================
    // TWO-NODE ORDERING
    // =============================================================================

    /// 100 concurrent propagations from node A are ordered by node B and
    /// come back to A's subscribers as 10 proposals in height order
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_propagation_across_nodes() {
        let node_b = NodeRuntime::new(node_config(10)).unwrap();
        node_b.start();

        // Node A: a gate wired to B over RPC, and a dispatcher accepting pushes.
        let gate_a = Arc::new(OrderingGateService::new());
        let remote: Arc<dyn PeerCommunicationService> =
            Arc::new(RemoteOrderingPcs::new(node_b.client()));
        assert!(gate_a.set_pcs(Arc::downgrade(&remote)));

        let dispatcher_a = Arc::new(Dispatcher::new(DispatchConfig::default()));
        register_proposal_sink(&dispatcher_a, Arc::clone(&gate_a)).unwrap();
        let dispatch_a = tokio::spawn(Arc::clone(&dispatcher_a).run());

        // Forward every proposal B orders to A.
        let mut from_b = node_b.gate().on_proposal();
        let client_a = dispatcher_a.client();
        let forwarder = tokio::spawn(async move {
            let mut forwarded = 0usize;
            while let Some(proposal) = from_b.next_proposal().await {
                let request = PushProposalRequest {
                    proposal: (*proposal).clone(),
                };
                if client_a.call(&PUSH_PROPOSAL, &request).await.is_ok() {
                    forwarded += 1;
                }
            }
            forwarded
        });

        let mut at_a = gate_a.on_proposal();

        let sends: Vec<_> = (0..100u64)
            .map(|counter| {
                let gate = Arc::clone(&gate_a);
                tokio::spawn(async move { gate.propagate_transaction(tx(counter)).await })
            })
            .collect();
        for send in sends {
            let outcome = timeout(Duration::from_secs(10), send).await.unwrap().unwrap();
            assert!(outcome.is_ok(), "propagation failed: {outcome:?}");
        }

        let mut seen = HashSet::new();
        for expected_height in 1..=10u64 {
            let proposal = timeout(Duration::from_secs(10), at_a.next_proposal())
                .await
                .expect("proposal not delivered in time")
                .expect("stream ended early");
            assert_eq!(proposal.height, expected_height);
            assert_eq!(proposal.len(), 10);
            for transaction in &proposal.transactions {
                assert!(seen.insert(transaction.hash()), "transaction ordered twice");
            }
        }
        assert_eq!(seen.len(), 100);

        let summary = node_b.shutdown().await.unwrap();
        assert_eq!(summary.discarded_at_shutdown, 0);
        assert_eq!(
            timeout(Duration::from_secs(5), forwarder).await.unwrap().unwrap(),
            10
        );

        gate_a.close();
        assert!(at_a.next_proposal().await.is_none());
        dispatcher_a.shutdown();
        timeout(Duration::from_secs(5), dispatch_a).await.unwrap().unwrap();
        drop(remote);
    }

    /// Once B is gone, A's remote PCS reports it as unreachable
    #[tokio::test]
    async fn test_remote_pcs_after_node_shutdown() {
        let node_b = NodeRuntime::new(node_config(10)).unwrap();
        node_b.start();

        let gate_a = OrderingGateService::new();
        let remote: Arc<dyn PeerCommunicationService> =
            Arc::new(RemoteOrderingPcs::new(node_b.client()));
        gate_a.set_pcs(Arc::downgrade(&remote));

        gate_a.propagate_transaction(tx(1)).await.unwrap();
        node_b.shutdown().await;

        let result = gate_a.propagate_transaction(tx(2)).await;
        assert!(
            matches!(result, Err(DeliveryError::Unreachable(_))),
            "unexpected {result:?}"
        );
    }
}
