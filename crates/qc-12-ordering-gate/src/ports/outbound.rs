//! Outbound Ports (Driven Ports / SPI)

use crate::domain::errors::PcsError;
use async_trait::async_trait;
use shared_types::SignedTransaction;
use std::sync::Arc;

/// Peer Communication Service
///
/// Carries transactions onward to whichever node runs ordering. Usually it
/// also owns the gate and publishes the proposals ordering produces.
#[async_trait]
pub trait PeerCommunicationService: Send + Sync {
    /// Hand a transaction to the ordering pipeline.
    async fn propagate_transaction(&self, transaction: Arc<SignedTransaction>)
        -> Result<(), PcsError>;
}
