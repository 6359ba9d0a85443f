//! Wire payloads for the ordering RPC methods

use qc_rpc_dispatch::MethodDescriptor;
use serde::{Deserialize, Serialize};
use shared_types::{Hash, Proposal, SignedTransaction};

/// Submit one transaction to the ordering node.
pub const SUBMIT_TRANSACTION: MethodDescriptor<SubmitTransactionRequest, SubmitTransactionResponse> =
    MethodDescriptor::new("ordering.SubmitTransaction");

/// Push one ordered proposal to a node's gate.
pub const PUSH_PROPOSAL: MethodDescriptor<PushProposalRequest, PushProposalResponse> =
    MethodDescriptor::new("ordering.PushProposal");

/// Request: transaction to order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitTransactionRequest {
    pub transaction: SignedTransaction,
}

/// Response: the transaction was accepted for ordering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitTransactionResponse {
    /// Hash of the accepted transaction
    pub tx_hash: Hash,
}

/// Request: an ordered proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushProposalRequest {
    pub proposal: Proposal,
}

/// Response: proposal fanned out to local subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushProposalResponse {
    pub height: u64,
    /// Subscribers that received the proposal
    pub delivered_to: usize,
}
