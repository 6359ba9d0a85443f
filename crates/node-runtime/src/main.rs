//! # Quantum-Chain Node Runtime
//!
//! The main entry point for the node.
//!
//! ## Request Flow
//!
//! ```text
//! RpcClient ──→ CompletionQueue ──→ Dispatcher workers
//!                                        │
//!        ┌───────────────────────────────┼──────────────────────────┐
//!        ↓                               ↓                          ↓
//! ordering.SubmitTransaction     ordering.PushProposal          query.*
//!        │                               │                          │
//!        ↓                               ↓                          ↓
//!   BatchingPcs ──Proposal──→ OrderingGateService ──→ ProposalStream subscribers
//!                                                              InMemoryWorldState
//! ```
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (defaults + environment)
//! 2. Initialize logging, then report ignored overrides
//! 3. Build the gate, the PCS and the dispatcher; wire gate → PCS
//! 4. Register all RPC methods
//! 5. Start dispatch workers and the batching pipeline
//! 6. Run until Ctrl+C, then shut down in order

use anyhow::Result;
use node_runtime::{load_config, NodeRuntime};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let (config, rejected) = load_config();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::new(&config.log_level))
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    for rejected in &rejected {
        warn!(
            key = rejected.key,
            value = %rejected.value,
            "Ignoring unparseable configuration override"
        );
    }

    // Create and start the node runtime
    let runtime = NodeRuntime::new(config)?;
    runtime.start();

    // Keep the node running
    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    // Graceful shutdown
    runtime.shutdown().await;

    Ok(())
}
