//! Server side of the ordering RPC methods.
//!
//! - `ordering.SubmitTransaction` runs on the ordering node and hands the
//!   transaction to its local ordering pipeline.
//! - `ordering.PushProposal` runs on every node and feeds the gate's
//!   proposal stream. One push carries one proposal.

use crate::application::service::OrderingGateService;
use crate::domain::errors::PcsError;
use crate::domain::value_objects::GateState;
use crate::ports::outbound::PeerCommunicationService;
use crate::rpc::payloads::{
    PushProposalRequest, PushProposalResponse, SubmitTransactionRequest,
    SubmitTransactionResponse,
};
use async_trait::async_trait;
use qc_rpc_dispatch::{CallContext, Responder, ServiceHandler, Status};
use std::sync::Arc;
use tracing::{debug, warn};

/// Handles `ordering.SubmitTransaction`.
pub struct SubmitTransactionHandler {
    pipeline: Arc<dyn PeerCommunicationService>,
}

impl SubmitTransactionHandler {
    pub fn new(pipeline: Arc<dyn PeerCommunicationService>) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl ServiceHandler<SubmitTransactionRequest, SubmitTransactionResponse>
    for SubmitTransactionHandler
{
    async fn handle(
        &self,
        ctx: &CallContext,
        request: SubmitTransactionRequest,
        responder: Responder<SubmitTransactionResponse>,
    ) {
        let transaction = Arc::new(request.transaction);
        let tx_hash = transaction.hash();

        match self.pipeline.propagate_transaction(transaction).await {
            Ok(()) => {
                debug!(call_id = %ctx.call_id(), "[qc-12] Transaction accepted for ordering");
                responder.send(SubmitTransactionResponse { tx_hash });
            }
            Err(e) => {
                warn!(call_id = %ctx.call_id(), error = %e, "[qc-12] Ordering pipeline refused transaction");
                responder.send_error(pcs_error_to_status(e));
            }
        }
    }
}

/// Handles `ordering.PushProposal`.
pub struct PushProposalHandler {
    gate: Arc<OrderingGateService>,
}

impl PushProposalHandler {
    pub fn new(gate: Arc<OrderingGateService>) -> Self {
        Self { gate }
    }
}

#[async_trait]
impl ServiceHandler<PushProposalRequest, PushProposalResponse> for PushProposalHandler {
    async fn handle(
        &self,
        ctx: &CallContext,
        request: PushProposalRequest,
        responder: Responder<PushProposalResponse>,
    ) {
        if self.gate.state() == GateState::Closed {
            responder.send_error(Status::failed_precondition("ordering gate is closed"));
            return;
        }

        let height = request.proposal.height;
        let delivered_to = self.gate.publish_proposal(request.proposal).await;
        debug!(call_id = %ctx.call_id(), height, delivered_to, "[qc-12] Proposal pushed");
        responder.send(PushProposalResponse {
            height,
            delivered_to,
        });
    }
}

fn pcs_error_to_status(err: PcsError) -> Status {
    match err {
        PcsError::Rejected(reason) => Status::failed_precondition(reason),
        PcsError::Unreachable(reason) => Status::unavailable(reason),
    }
}
