//! RPC surface of the Ordering Gate
//!
//! ## Methods
//!
//! | Method | Served by | Effect |
//! |--------|-----------|--------|
//! | `ordering.SubmitTransaction` | ordering node | transaction enters the ordering pipeline |
//! | `ordering.PushProposal` | every node | proposal published on the local gate |

pub mod handler;
pub mod payloads;
pub mod remote_pcs;

pub use handler::{PushProposalHandler, SubmitTransactionHandler};
pub use payloads::*;
pub use remote_pcs::RemoteOrderingPcs;

use crate::application::service::OrderingGateService;
use crate::ports::outbound::PeerCommunicationService;
use qc_rpc_dispatch::{DispatchError, Dispatcher};
use std::sync::Arc;

/// Serve `ordering.SubmitTransaction`, feeding `pipeline`.
pub fn register_ordering_service(
    dispatcher: &Dispatcher,
    pipeline: Arc<dyn PeerCommunicationService>,
) -> Result<(), DispatchError> {
    dispatcher.register_method(SUBMIT_TRANSACTION, SubmitTransactionHandler::new(pipeline))
}

/// Serve `ordering.PushProposal`, publishing on `gate`.
pub fn register_proposal_sink(
    dispatcher: &Dispatcher,
    gate: Arc<OrderingGateService>,
) -> Result<(), DispatchError> {
    dispatcher.register_method(PUSH_PROPOSAL, PushProposalHandler::new(gate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::{DeliveryError, PcsError};
    use crate::ports::inbound::OrderingGate;
    use crate::ports::outbound::mocks::{FailingPcs, RecordingPcs};
    use qc_rpc_dispatch::{DispatchConfig, DispatchSummary, StatusCode};
    use shared_types::{Proposal, SignedTransaction};
    use std::time::Duration;
    use tokio::task::JoinHandle;
    use tokio::time::timeout;

    fn tx(counter: u64) -> SignedTransaction {
        SignedTransaction {
            creator: [3; 32],
            created_ts: 42,
            tx_counter: counter,
            payload: b"transfer".to_vec(),
            signature: [9; 64],
        }
    }

    fn start(dispatcher: &Arc<Dispatcher>) -> JoinHandle<DispatchSummary> {
        tokio::spawn(Arc::clone(dispatcher).run())
    }

    async fn stop(dispatcher: &Arc<Dispatcher>, handle: JoinHandle<DispatchSummary>) {
        dispatcher.shutdown();
        timeout(Duration::from_secs(5), handle)
            .await
            .expect("dispatch loop did not exit")
            .unwrap();
    }

    #[tokio::test]
    async fn test_gate_propagates_through_remote_pcs() {
        let dispatcher = Arc::new(Dispatcher::new(DispatchConfig::default()));
        let pipeline = Arc::new(RecordingPcs::default());
        register_ordering_service(&dispatcher, pipeline.clone()).unwrap();
        let handle = start(&dispatcher);

        let gate = OrderingGateService::new();
        let remote: Arc<dyn PeerCommunicationService> =
            Arc::new(RemoteOrderingPcs::new(dispatcher.client()));
        assert!(gate.set_pcs(Arc::downgrade(&remote)));

        let t = Arc::new(tx(1));
        gate.propagate_transaction(Arc::clone(&t)).await.unwrap();
        assert_eq!(pipeline.received(), vec![t.hash()]);

        stop(&dispatcher, handle).await;
    }

    #[tokio::test]
    async fn test_refused_transaction_is_rejected() {
        let dispatcher = Arc::new(Dispatcher::new(DispatchConfig::default()));
        register_ordering_service(
            &dispatcher,
            Arc::new(FailingPcs(PcsError::Rejected("stale counter".into()))),
        )
        .unwrap();
        let handle = start(&dispatcher);

        let gate = OrderingGateService::new();
        let remote: Arc<dyn PeerCommunicationService> =
            Arc::new(RemoteOrderingPcs::new(dispatcher.client()));
        gate.set_pcs(Arc::downgrade(&remote));

        assert_eq!(
            gate.propagate_transaction(Arc::new(tx(1))).await,
            Err(DeliveryError::Rejected("stale counter".into()))
        );
        stop(&dispatcher, handle).await;
    }

    #[tokio::test]
    async fn test_unserved_ordering_is_rejected_as_unimplemented() {
        let dispatcher = Arc::new(Dispatcher::new(DispatchConfig::default()));
        let handle = start(&dispatcher);

        let remote = RemoteOrderingPcs::new(dispatcher.client());
        let result = remote.propagate_transaction(Arc::new(tx(1))).await;
        assert!(matches!(result, Err(PcsError::Rejected(_))));
        stop(&dispatcher, handle).await;
    }

    #[tokio::test]
    async fn test_pushed_proposals_reach_subscribers_in_order() {
        let dispatcher = Arc::new(Dispatcher::new(DispatchConfig::default()));
        let gate = Arc::new(OrderingGateService::new());
        register_proposal_sink(&dispatcher, Arc::clone(&gate)).unwrap();
        let handle = start(&dispatcher);

        let mut stream = gate.on_proposal();
        let client = dispatcher.client();
        for height in 1..=3 {
            let proposal = Proposal::new(height, vec![tx(height)], 0);
            let response = client
                .call(&PUSH_PROPOSAL, &PushProposalRequest { proposal })
                .await
                .unwrap();
            assert_eq!(response.height, height);
            assert_eq!(response.delivered_to, 1);
        }
        for height in 1..=3 {
            let proposal = timeout(Duration::from_secs(5), stream.next_proposal())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(proposal.height, height);
            assert_eq!(proposal.transactions, vec![tx(height)]);
        }

        gate.close();
        let status = client
            .call(
                &PUSH_PROPOSAL,
                &PushProposalRequest {
                    proposal: Proposal::new(4, vec![], 0),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(status.code, StatusCode::FailedPrecondition);

        stop(&dispatcher, handle).await;
    }
}
