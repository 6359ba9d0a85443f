//! Ordering Gate Service
//!
//! Main service implementing `OrderingGate`.
//!
//! ## Proposal fan-out
//!
//! Every subscriber gets its own bounded channel. Publishing is serialized
//! and waits for channel capacity instead of dropping, so all subscribers see
//! the same proposals in the same order.

use crate::application::stream::ProposalStream;
use crate::config::GateConfig;
use crate::domain::errors::DeliveryError;
use crate::domain::value_objects::GateState;
use crate::ports::inbound::OrderingGate;
use crate::ports::outbound::PeerCommunicationService;
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{Proposal, SignedTransaction};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Gate counters
#[derive(Debug, Default)]
pub struct GateStats {
    /// Transactions accepted by the PCS
    pub transactions_propagated: AtomicU64,
    /// Propagations that returned an error
    pub delivery_failures: AtomicU64,
    /// Proposals fanned out to subscribers
    pub proposals_published: AtomicU64,
}

/// Ordering Gate Service
pub struct OrderingGateService {
    config: GateConfig,
    pcs: OnceLock<Weak<dyn PeerCommunicationService>>,
    subscribers: Mutex<Vec<mpsc::Sender<Arc<Proposal>>>>,
    publish_lock: tokio::sync::Mutex<()>,
    closed: AtomicBool,
    stats: GateStats,
}

impl OrderingGateService {
    /// Create a new gate with default config
    pub fn new() -> Self {
        Self::with_config(GateConfig::default())
    }

    /// Create a new gate with custom config
    pub fn with_config(config: GateConfig) -> Self {
        Self {
            config,
            pcs: OnceLock::new(),
            subscribers: Mutex::new(Vec::new()),
            publish_lock: tokio::sync::Mutex::new(()),
            closed: AtomicBool::new(false),
            stats: GateStats::default(),
        }
    }

    pub fn state(&self) -> GateState {
        if self.closed.load(Ordering::Acquire) {
            GateState::Closed
        } else if self.pcs.get().is_some() {
            GateState::Wired
        } else {
            GateState::Unwired
        }
    }

    pub fn stats(&self) -> &GateStats {
        &self.stats
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Deliver an ordered proposal to every current subscriber.
    ///
    /// Waits while a subscriber's buffer is full. Returns how many
    /// subscribers received it.
    pub async fn publish_proposal(&self, proposal: Proposal) -> usize {
        let _guard = self.publish_lock.lock().await;
        if self.closed.load(Ordering::Acquire) {
            warn!(height = proposal.height, "[qc-12] Proposal published after close, dropping");
            return 0;
        }

        let proposal = Arc::new(proposal);
        let subscribers = self.subscribers.lock().clone();
        let mut delivered = 0;
        for subscriber in &subscribers {
            if subscriber.send(Arc::clone(&proposal)).await.is_ok() {
                delivered += 1;
            }
        }

        // Forget subscribers whose stream was dropped.
        self.subscribers.lock().retain(|s| !s.is_closed());
        self.stats.proposals_published.fetch_add(1, Ordering::Relaxed);

        debug!(
            height = proposal.height,
            transactions = proposal.len(),
            delivered,
            "[qc-12] Proposal published"
        );
        delivered
    }

    /// Shut the gate down.
    ///
    /// Every proposal stream ends; further propagation fails with `Closed`.
    /// Idempotent.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let subscribers = std::mem::take(&mut *self.subscribers.lock());
        info!(
            subscribers = subscribers.len(),
            "[qc-12] Ordering gate closed"
        );
    }
}

impl Default for OrderingGateService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderingGate for OrderingGateService {
    async fn propagate_transaction(
        &self,
        transaction: Arc<SignedTransaction>,
    ) -> Result<(), DeliveryError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(DeliveryError::Closed);
        }
        let pcs = self
            .pcs
            .get()
            .ok_or(DeliveryError::NotWired)?
            .upgrade()
            .ok_or(DeliveryError::PcsUnavailable)?;

        match pcs.propagate_transaction(Arc::clone(&transaction)).await {
            Ok(()) => {
                self.stats
                    .transactions_propagated
                    .fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(e) => {
                self.stats.delivery_failures.fetch_add(1, Ordering::Relaxed);
                warn!(
                    tx_counter = transaction.tx_counter,
                    error = %e,
                    "[qc-12] Transaction propagation failed"
                );
                Err(e.into())
            }
        }
    }

    fn on_proposal(&self) -> ProposalStream {
        let (sender, receiver) = mpsc::channel(self.config.proposal_buffer.max(1));
        let mut subscribers = self.subscribers.lock();
        // A closed gate hands out streams that end immediately.
        if !self.closed.load(Ordering::Acquire) {
            subscribers.push(sender);
        }
        debug!(subscribers = subscribers.len(), "[qc-12] New proposal subscriber");
        ProposalStream::new(receiver)
    }

    fn set_pcs(&self, pcs: Weak<dyn PeerCommunicationService>) -> bool {
        let wired = self.pcs.set(pcs).is_ok();
        if wired {
            info!("[qc-12] Ordering gate wired to peer communication service");
        } else {
            warn!("[qc-12] Ordering gate already wired, ignoring new association");
        }
        wired
    }
}
