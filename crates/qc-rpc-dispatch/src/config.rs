//! Configuration for the RPC dispatcher

use serde::{Deserialize, Serialize};

/// Dispatcher configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Number of workers draining the completion queue
    pub worker_count: usize,
    /// Requests allowed to wait per method while no call is armed
    pub max_backlog_per_method: usize,
    /// Buffered lifecycle events per observer before it lags
    pub lifecycle_buffer: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            worker_count: 2,
            max_backlog_per_method: 1024,
            lifecycle_buffer: 4096,
        }
    }
}
