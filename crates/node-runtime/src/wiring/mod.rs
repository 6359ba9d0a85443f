//! # Node Wiring
//!
//! Builds the node's components, closes the gate/PCS cycle and owns the
//! background tasks.
//!
//! ## Ownership
//!
//! ```text
//! Dispatcher ──Arc──→ SubmitTransactionHandler ──Arc──→ BatchingPcs ──Arc──→ OrderingGateService
//!      │                                                     ↑                     │
//!      └──Arc──→ PushProposalHandler ──Arc──→ gate           └──────── Weak ───────┘
//! ```
//!
//! ## Shutdown Sequence
//!
//! 1. Stop the batching pipeline (flushes the last partial batch)
//! 2. Close the gate (proposal streams end)
//! 3. Shut down the completion queue and wait for the dispatch loop

use crate::adapters::{BatchingPcs, InMemoryWorldState};
use crate::container::NodeConfig;
use crate::handlers::register_query_service;
use anyhow::{Context, Result};
use parking_lot::Mutex;
use qc_12_ordering_gate::{
    register_ordering_service, register_proposal_sink, OrderingGate, OrderingGateService,
    PeerCommunicationService,
};
use qc_rpc_dispatch::{DispatchSummary, Dispatcher, RpcClient};
use shared_types::QueryApi;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// The running node: dispatcher, gate, local ordering pipeline.
pub struct NodeRuntime {
    config: NodeConfig,
    dispatcher: Arc<Dispatcher>,
    gate: Arc<OrderingGateService>,
    pcs: Arc<BatchingPcs>,
    shutdown_tx: watch::Sender<bool>,
    dispatch_task: Mutex<Option<JoinHandle<DispatchSummary>>>,
    batching_task: Mutex<Option<JoinHandle<()>>>,
}

impl NodeRuntime {
    /// Build the node with an empty in-memory world state.
    pub fn new(config: NodeConfig) -> Result<Self> {
        Self::with_world_state(config, Arc::new(InMemoryWorldState::new()))
    }

    /// Build the node, serving queries from `world_state`.
    ///
    /// The gate is created first, then the PCS that owns it, then the gate
    /// is wired back to the PCS. All methods are registered before anything
    /// runs.
    pub fn with_world_state(config: NodeConfig, world_state: Arc<dyn QueryApi>) -> Result<Self> {
        config.validate().context("Invalid node configuration")?;

        let dispatcher = Arc::new(Dispatcher::new(config.rpc.clone()));
        let gate = Arc::new(OrderingGateService::with_config(config.gate.clone()));
        let pcs = Arc::new(BatchingPcs::new(Arc::clone(&gate), config.batching.clone()));

        let pcs_port: Arc<dyn PeerCommunicationService> = pcs.clone();
        if !gate.set_pcs(Arc::downgrade(&pcs_port)) {
            anyhow::bail!("ordering gate was already wired");
        }

        register_ordering_service(&dispatcher, pcs_port)
            .context("Failed to register ordering service")?;
        register_proposal_sink(&dispatcher, Arc::clone(&gate))
            .context("Failed to register proposal sink")?;
        register_query_service(&dispatcher, world_state)
            .context("Failed to register query service")?;

        let (shutdown_tx, _) = watch::channel(false);

        info!(
            methods = dispatcher.registered_methods().len(),
            "Node runtime wired"
        );

        Ok(Self {
            config,
            dispatcher,
            gate,
            pcs,
            shutdown_tx,
            dispatch_task: Mutex::new(None),
            batching_task: Mutex::new(None),
        })
    }

    /// Spawn the dispatch loop and the batching pipeline.
    pub fn start(&self) {
        let mut dispatch_task = self.dispatch_task.lock();
        if dispatch_task.is_some() {
            warn!("Node runtime already started");
            return;
        }

        info!("===========================================");
        info!("  Quantum-Chain Node Runtime v0.1.0");
        info!("===========================================");

        *dispatch_task = Some(tokio::spawn(Arc::clone(&self.dispatcher).run()));
        *self.batching_task.lock() = Some(tokio::spawn(
            Arc::clone(&self.pcs).run(self.shutdown_tx.subscribe()),
        ));

        info!(
            workers = self.config.rpc.worker_count,
            batch_size = self.config.batching.max_batch_size,
            batch_interval_ms = self.config.batching.batch_interval_ms,
            "Node runtime started"
        );
    }

    /// Stop everything in order and wait for the dispatch loop to exit.
    ///
    /// Returns the dispatch summary, or `None` if the node was never started.
    pub async fn shutdown(&self) -> Option<DispatchSummary> {
        info!("Initiating graceful shutdown...");

        if self.shutdown_tx.send(true).is_err() {
            warn!("Batching pipeline already stopped");
        }
        let batching = self.batching_task.lock().take();
        if let Some(task) = batching {
            if let Err(e) = task.await {
                error!(error = %e, "Batching pipeline task failed");
            }
        }

        self.gate.close();
        self.dispatcher.shutdown();

        let dispatch = self.dispatch_task.lock().take();
        let summary = match dispatch {
            Some(task) => match task.await {
                Ok(summary) => Some(summary),
                Err(e) => {
                    error!(error = %e, "Dispatch loop task failed");
                    None
                }
            },
            None => None,
        };

        info!(summary = ?summary, "Shutdown complete");
        summary
    }

    /// Client connected to this node's dispatcher.
    pub fn client(&self) -> RpcClient {
        self.dispatcher.client()
    }

    pub fn gate(&self) -> &Arc<OrderingGateService> {
        &self.gate
    }

    /// Gate as its port.
    pub fn ordering_gate(&self) -> Arc<dyn OrderingGate> {
        self.gate.clone()
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn pcs(&self) -> &Arc<BatchingPcs> {
        &self.pcs
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }
}
