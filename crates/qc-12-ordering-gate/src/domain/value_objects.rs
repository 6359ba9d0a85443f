//! Value objects for the Ordering Gate

use serde::{Deserialize, Serialize};

/// Where the gate is in its life.
///
/// `Unwired → Wired → Closed`. A gate may also be closed before it is wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateState {
    /// No PCS association yet
    Unwired,
    /// PCS association set; it may since have been dropped
    Wired,
    /// Shut down: propagation fails, proposal streams have ended
    Closed,
}
