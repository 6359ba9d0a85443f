//! Error types for the Ordering Gate

use thiserror::Error;

/// Why a transaction could not be handed to the ordering pipeline.
///
/// The gate never retries; callers decide.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// `set_pcs` has not been called yet
    #[error("Ordering gate is not wired to a peer communication service")]
    NotWired,

    /// The PCS this gate was wired to has been dropped
    #[error("Peer communication service is no longer available")]
    PcsUnavailable,

    /// The ordering pipeline refused the transaction
    #[error("Transaction rejected: {0}")]
    Rejected(String),

    /// The ordering pipeline could not be reached
    #[error("Ordering service unreachable: {0}")]
    Unreachable(String),

    /// The gate has been shut down
    #[error("Ordering gate is closed")]
    Closed,
}

/// Errors reported by a peer communication service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PcsError {
    #[error("Rejected by ordering service: {0}")]
    Rejected(String),

    #[error("Ordering service unreachable: {0}")]
    Unreachable(String),
}

impl From<PcsError> for DeliveryError {
    fn from(err: PcsError) -> Self {
        match err {
            PcsError::Rejected(reason) => DeliveryError::Rejected(reason),
            PcsError::Unreachable(reason) => DeliveryError::Unreachable(reason),
        }
    }
}
