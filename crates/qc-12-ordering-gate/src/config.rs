//! Configuration for the Ordering Gate

use serde::{Deserialize, Serialize};

/// Gate configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GateConfig {
    /// Proposals buffered per subscriber before the publisher waits
    pub proposal_buffer: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            proposal_buffer: 64,
        }
    }
}
