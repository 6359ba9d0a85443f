//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Ordering**: `SignedTransaction`, `Proposal`
//! - **World State**: `Account`, `Asset`, `Domain`, `Wallet`

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use sha2::{Digest, Sha256};

// =============================================================================
// CLUSTER A: ORDERING
// =============================================================================

/// A 32-byte SHA-256 hash.
pub type Hash = [u8; 32];

/// A 64-byte Ed25519 signature.
pub type Signature = [u8; 64];

/// A 32-byte Ed25519 public key.
pub type PublicKey = [u8; 32];

/// A transaction signed by its creator, as submitted for ordering.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    /// Creator's public key.
    pub creator: PublicKey,
    /// Creation time (milliseconds since Unix epoch).
    pub created_ts: u64,
    /// Per-creator counter to tell otherwise identical transactions apart.
    pub tx_counter: u64,
    /// Encoded commands.
    pub payload: Vec<u8>,
    /// Creator's signature over the transaction.
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
}

impl SignedTransaction {
    /// Compute the transaction hash.
    ///
    /// The signature is not part of the hash.
    pub fn hash(&self) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update(self.creator);
        hasher.update(self.created_ts.to_le_bytes());
        hasher.update(self.tx_counter.to_le_bytes());
        hasher.update(&self.payload);
        hasher.finalize().into()
    }
}

/// A totally-ordered batch of transactions produced by the ordering subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Proposal {
    /// Height of the block this proposal is meant for.
    pub height: u64,
    /// Transactions in their final order.
    pub transactions: Vec<SignedTransaction>,
    /// Creation time (milliseconds since Unix epoch).
    pub created_ts: u64,
}

impl Proposal {
    /// Create a proposal from already ordered transactions.
    pub fn new(height: u64, transactions: Vec<SignedTransaction>, created_ts: u64) -> Self {
        Self {
            height,
            transactions,
            created_ts,
        }
    }

    /// Hash over the height and the ordered transaction hashes.
    pub fn hash(&self) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update(self.height.to_le_bytes());
        for tx in &self.transactions {
            hasher.update(tx.hash());
        }
        hasher.finalize().into()
    }

    /// Number of transactions in the proposal.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Whether the proposal carries no transactions.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

// =============================================================================
// CLUSTER B: WORLD STATE
// =============================================================================

/// An account registered in a domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Full account id (`name@domain`).
    pub account_id: String,
    /// Domain the account belongs to.
    pub domain_id: String,
    /// Number of signatures required to authorize a transaction.
    pub quorum: u32,
    /// Arbitrary JSON attached to the account.
    pub json_data: String,
}

/// An asset definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Full asset id (`name#domain`).
    pub asset_id: String,
    /// Domain the asset belongs to.
    pub domain_id: String,
    /// Number of decimal places.
    pub precision: u8,
}

/// A domain of accounts and assets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    /// Domain id.
    pub domain_id: String,
    /// Role granted to accounts created in this domain.
    pub default_role: String,
}

/// Balance of one asset held by one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Unique wallet id.
    pub wallet_id: String,
    /// Owning account.
    pub account_id: String,
    /// Held asset (`name#domain`).
    pub asset_id: String,
    /// Balance as a decimal string, precision given by the asset.
    pub balance: String,
}
