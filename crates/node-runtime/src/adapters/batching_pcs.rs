//! # Batching PCS
//!
//! Local ordering pipeline for a single node. Transactions are ordered by
//! arrival and cut into proposals when a batch fills up or the batch
//! interval elapses, whichever comes first. Proposals are published on the
//! gate this PCS owns.
//!
//! ```text
//! propagate_transaction ──→ pending batch ──(size | interval)──→ outbox
//!                                                                   │
//!                              publisher task: gate.publish_proposal ←─┘
//! ```
//!
//! Cutting a batch only enqueues the proposal, so submitters never wait on
//! a slow subscriber. The publisher drains the outbox in height order.
//! Arrival order is the only ordering rule; no voting takes place.

use async_trait::async_trait;
use parking_lot::Mutex;
use qc_12_ordering_gate::{OrderingGateService, PcsError, PeerCommunicationService};
use serde::{Deserialize, Serialize};
use shared_types::{Hash, Proposal, SignedTransaction};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// Batching configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchingConfig {
    /// Transactions per proposal before it is cut early
    pub max_batch_size: usize,
    /// Longest time a transaction waits for its batch (milliseconds)
    pub batch_interval_ms: u64,
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 10,
            batch_interval_ms: 500,
        }
    }
}

struct PendingBatch {
    transactions: Vec<SignedTransaction>,
    hashes: HashSet<Hash>,
    /// `None` once the pipeline has stopped.
    outbox: Option<mpsc::UnboundedSender<Proposal>>,
}

/// FIFO batcher acting as this node's peer communication service.
pub struct BatchingPcs {
    config: BatchingConfig,
    gate: Arc<OrderingGateService>,
    pending: Mutex<PendingBatch>,
    outbox_rx: Mutex<Option<mpsc::UnboundedReceiver<Proposal>>>,
    next_height: AtomicU64,
}

impl BatchingPcs {
    /// Create a batcher publishing on `gate`. The first proposal has height 1.
    ///
    /// Proposals are cut from the start but only reach the gate once `run`
    /// is driving the publisher.
    pub fn new(gate: Arc<OrderingGateService>, config: BatchingConfig) -> Self {
        let (outbox, outbox_rx) = mpsc::unbounded_channel();
        Self {
            config,
            gate,
            pending: Mutex::new(PendingBatch {
                transactions: Vec::new(),
                hashes: HashSet::new(),
                outbox: Some(outbox),
            }),
            outbox_rx: Mutex::new(Some(outbox_rx)),
            next_height: AtomicU64::new(1),
        }
    }

    /// Transactions waiting for their batch.
    pub fn pending_len(&self) -> usize {
        self.pending.lock().transactions.len()
    }

    /// Whether the pipeline has stopped accepting transactions.
    pub fn is_stopped(&self) -> bool {
        self.pending.lock().outbox.is_none()
    }

    /// Cut the pending batch now. Returns the height of the queued
    /// proposal, or `None` if nothing was pending.
    pub fn flush(&self) -> Option<u64> {
        let mut pending = self.pending.lock();
        self.cut(&mut pending)
    }

    /// Publish queued proposals and cut batches on the configured interval
    /// until `shutdown` fires. Then cut what is left, stop accepting
    /// transactions and wait until every queued proposal was published.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let Some(mut outbox) = self.outbox_rx.lock().take() else {
            warn!("[qc-12] Batching pipeline already running");
            return;
        };
        let gate = Arc::clone(&self.gate);
        let publisher = tokio::spawn(async move {
            while let Some(proposal) = outbox.recv().await {
                let height = proposal.height;
                let size = proposal.len();
                let delivered = gate.publish_proposal(proposal).await;
                debug!(height, size, delivered, "[qc-12] Proposal emitted");
            }
        });

        let mut ticker =
            tokio::time::interval(Duration::from_millis(self.config.batch_interval_ms.max(1)));
        // The first tick completes immediately.
        ticker.tick().await;
        info!(
            max_batch_size = self.config.max_batch_size,
            batch_interval_ms = self.config.batch_interval_ms,
            "[qc-12] Batching pipeline started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.flush();
                }
                _ = shutdown.changed() => break,
            }
        }

        let last = self.stop();
        if let Err(e) = publisher.await {
            error!(error = %e, "[qc-12] Proposal publisher failed");
        }
        info!(last_height = ?last, "[qc-12] Batching pipeline stopped");
    }

    /// Cut the last batch and close the outbox.
    fn stop(&self) -> Option<u64> {
        let mut pending = self.pending.lock();
        let last = self.cut(&mut pending);
        pending.outbox = None;
        last
    }

    // Heights are taken and queued under the pending lock, so the outbox
    // carries proposals in height order.
    fn cut(&self, pending: &mut PendingBatch) -> Option<u64> {
        if pending.transactions.is_empty() {
            return None;
        }
        let outbox = pending.outbox.clone()?;
        let transactions = std::mem::take(&mut pending.transactions);
        pending.hashes.clear();

        let height = self.next_height.fetch_add(1, Ordering::Relaxed);
        let created_ts = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0);
        if outbox
            .send(Proposal::new(height, transactions, created_ts))
            .is_err()
        {
            warn!(height, "[qc-12] Proposal publisher gone, proposal lost");
        }
        Some(height)
    }
}

#[async_trait]
impl PeerCommunicationService for BatchingPcs {
    async fn propagate_transaction(
        &self,
        transaction: Arc<SignedTransaction>,
    ) -> Result<(), PcsError> {
        let hash = transaction.hash();
        let mut pending = self.pending.lock();
        if pending.outbox.is_none() {
            return Err(PcsError::Unreachable(
                "ordering pipeline stopped".to_string(),
            ));
        }
        if !pending.hashes.insert(hash) {
            return Err(PcsError::Rejected(
                "transaction already pending".to_string(),
            ));
        }
        pending.transactions.push((*transaction).clone());

        if pending.transactions.len() >= self.config.max_batch_size {
            self.cut(&mut pending);
        }
        Ok(())
    }
}
