//! # Error Types
//!
//! Errors shared between the world-state query port and its consumers.

use thiserror::Error;

/// Errors returned by a [`crate::QueryApi`] backend.
///
/// Backends fetch a row and map it to a domain object; each failure mode is
/// kept distinct so RPC handlers can map it to a response status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// No row matched the key.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A row was found but could not be mapped to the domain object.
    #[error("Decode failed: {0}")]
    DecodeFailed(String),

    /// The statement failed or the backend could not be reached.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl QueryError {
    /// Whether the caller could reasonably retry later.
    pub fn is_transient(&self) -> bool {
        matches!(self, QueryError::Unavailable(_))
    }
}
