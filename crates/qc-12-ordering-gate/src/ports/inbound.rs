//! Inbound Ports (Driving Ports / API)

use crate::application::stream::ProposalStream;
use crate::domain::errors::DeliveryError;
use crate::ports::outbound::PeerCommunicationService;
use async_trait::async_trait;
use shared_types::SignedTransaction;
use std::sync::{Arc, Weak};

/// Primary Ordering Gate API
#[async_trait]
pub trait OrderingGate: Send + Sync {
    /// Submit a transaction to the ordering pipeline.
    ///
    /// Resolves once the PCS has accepted or refused it. Failures are never
    /// retried by the gate.
    async fn propagate_transaction(
        &self,
        transaction: Arc<SignedTransaction>,
    ) -> Result<(), DeliveryError>;

    /// Subscribe to ordered proposals.
    ///
    /// The stream only carries proposals published after this call. It ends
    /// when the gate closes.
    fn on_proposal(&self) -> ProposalStream;

    /// Associate the gate with a PCS it does not own.
    ///
    /// Only the first call takes effect and returns `true`; later calls
    /// return `false` and leave the association unchanged.
    fn set_pcs(&self, pcs: Weak<dyn PeerCommunicationService>) -> bool;
}
