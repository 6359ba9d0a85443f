//! # Node Configuration
//!
//! Unified configuration for the RPC dispatcher, the ordering gate and the
//! local ordering pipeline.
//!
//! ## Environment Overrides
//!
//! | Variable | Field |
//! |----------|-------|
//! | `QC_RPC_WORKERS` | `rpc.worker_count` |
//! | `QC_RPC_MAX_BACKLOG` | `rpc.max_backlog_per_method` |
//! | `QC_PROPOSAL_BUFFER` | `gate.proposal_buffer` |
//! | `QC_BATCH_SIZE` | `batching.max_batch_size` |
//! | `QC_BATCH_INTERVAL_MS` | `batching.batch_interval_ms` |
//! | `QC_LOG_LEVEL` | `log_level` |

use crate::adapters::batching_pcs::BatchingConfig;
use qc_12_ordering_gate::GateConfig;
use qc_rpc_dispatch::DispatchConfig;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Complete node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// RPC dispatcher configuration.
    pub rpc: DispatchConfig,
    /// Ordering gate configuration.
    pub gate: GateConfig,
    /// Local ordering pipeline configuration.
    pub batching: BatchingConfig,
    /// `tracing` filter directive, e.g. `info` or `qc_rpc_dispatch=debug`.
    pub log_level: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            rpc: DispatchConfig::default(),
            gate: GateConfig::default(),
            batching: BatchingConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl NodeConfig {
    /// Apply overrides from a variable lookup (normally the process environment).
    ///
    /// Unparseable values leave the field unchanged and are returned so
    /// they can be reported once logging is up.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Vec<RejectedOverride> {
        let mut rejected = Vec::new();
        override_parsed(&lookup, "QC_RPC_WORKERS", &mut self.rpc.worker_count, &mut rejected);
        override_parsed(
            &lookup,
            "QC_RPC_MAX_BACKLOG",
            &mut self.rpc.max_backlog_per_method,
            &mut rejected,
        );
        override_parsed(&lookup, "QC_PROPOSAL_BUFFER", &mut self.gate.proposal_buffer, &mut rejected);
        override_parsed(&lookup, "QC_BATCH_SIZE", &mut self.batching.max_batch_size, &mut rejected);
        override_parsed(
            &lookup,
            "QC_BATCH_INTERVAL_MS",
            &mut self.batching.batch_interval_ms,
            &mut rejected,
        );
        if let Some(level) = lookup("QC_LOG_LEVEL") {
            self.log_level = level;
        }
        rejected
    }

    /// Reject configurations the runtime cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rpc.worker_count == 0 {
            return Err(ConfigError::Zero("rpc.worker_count"));
        }
        if self.gate.proposal_buffer == 0 {
            return Err(ConfigError::Zero("gate.proposal_buffer"));
        }
        if self.batching.max_batch_size == 0 {
            return Err(ConfigError::Zero("batching.max_batch_size"));
        }
        if self.batching.batch_interval_ms == 0 {
            return Err(ConfigError::Zero("batching.batch_interval_ms"));
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A field that must be positive is zero.
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// An environment override that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedOverride {
    pub key: &'static str,
    pub value: String,
}

/// Load configuration from defaults and the process environment.
///
/// Also returns the overrides that were ignored.
pub fn load_config() -> (NodeConfig, Vec<RejectedOverride>) {
    let mut config = NodeConfig::default();
    let rejected = config.apply_overrides(|key| std::env::var(key).ok());
    (config, rejected)
}

fn override_parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    field: &mut T,
    rejected: &mut Vec<RejectedOverride>,
) {
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.parse() {
        Ok(value) => *field = value,
        Err(_) => rejected.push(RejectedOverride { key, value: raw }),
    }
}
