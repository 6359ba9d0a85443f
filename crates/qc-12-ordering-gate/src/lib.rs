//! # QC-12: Ordering Gate
//!
//! The node's entry point into the ordering pipeline. Transactions go out
//! through the Peer Communication Service (PCS); totally-ordered proposals
//! come back as a push stream.
//!
//! ## Architecture
//!
//! - **Domain**: Delivery errors, gate state
//! - **Ports**: Inbound (`OrderingGate`) and Outbound (`PeerCommunicationService`)
//! - **Application**: `OrderingGateService`, `ProposalStream`
//! - **RPC**: `ordering.SubmitTransaction` / `ordering.PushProposal` handlers
//!   and the `RemoteOrderingPcs` client
//!
//! ## Ownership
//!
//! ```text
//!   ┌──────────────────────┐   Arc (strong)   ┌──────────────────────┐
//!   │ PeerCommunication-   │ ───────────────→ │ OrderingGateService  │
//!   │ Service              │ ←─────────────── │                      │
//!   └──────────────────────┘   Weak, set once └──────────────────────┘
//! ```
//!
//! The PCS owns the gate. The gate only observes the PCS, so dropping the PCS
//! frees both and propagation reports `PcsUnavailable` from then on.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod rpc;

pub use application::service::{GateStats, OrderingGateService};
pub use application::stream::ProposalStream;
pub use config::GateConfig;
pub use domain::errors::{DeliveryError, PcsError};
pub use domain::value_objects::GateState;
pub use ports::inbound::OrderingGate;
pub use ports::outbound::PeerCommunicationService;
pub use rpc::{
    register_ordering_service, register_proposal_sink, PushProposalRequest,
    PushProposalResponse, RemoteOrderingPcs, SubmitTransactionRequest,
    SubmitTransactionResponse, PUSH_PROPOSAL, SUBMIT_TRANSACTION,
};
