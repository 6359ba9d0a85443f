//! World-state query port.
//!
//! Read-only getters over the world state view. Implementations perform a
//! synchronous row fetch and either return the decoded domain object or a
//! typed [`QueryError`]. Callers on async paths must run them off the
//! runtime's worker threads.

use crate::entities::{Account, Asset, Domain, PublicKey, SignedTransaction, Wallet};
use crate::errors::QueryError;

/// Lazily produced sequence of transactions.
pub type TransactionIter = Box<dyn Iterator<Item = SignedTransaction> + Send>;

/// Read-only query API over the world state.
pub trait QueryApi: Send + Sync {
    /// Get account by its first public key.
    fn get_account(&self, pub_key: &PublicKey) -> Result<Account, QueryError>;

    /// Get asset by full name, e.g. `usd#soramitsu.co.jp`.
    fn get_asset(&self, asset_full_name: &str) -> Result<Asset, QueryError>;

    /// Get domain by its full name.
    fn get_domain(&self, domain_full_name: &str) -> Result<Domain, QueryError>;

    /// Get wallet by id.
    fn get_wallet(&self, wallet_id: &str) -> Result<Wallet, QueryError>;

    /// Get all wallets of an account.
    fn get_account_wallets(&self, pub_key: &PublicKey) -> Result<Vec<Wallet>, QueryError>;

    /// Get all assets of a domain.
    fn get_domain_assets(&self, domain_full_name: &str) -> Result<Vec<Asset>, QueryError>;

    /// Get all transactions created by an account.
    fn get_account_transactions(&self, pub_key: &PublicKey)
        -> Result<TransactionIter, QueryError>;
}
