//! # In-Memory World State
//!
//! `QueryApi` backend holding the world state in maps. Used by the node
//! runtime until a storage backend is plugged in, and by tests.

use parking_lot::RwLock;
use shared_types::{
    Account, Asset, Domain, PublicKey, QueryApi, QueryError, SignedTransaction, TransactionIter,
    Wallet,
};
use std::collections::HashMap;

#[derive(Default)]
struct Tables {
    accounts: HashMap<PublicKey, Account>,
    assets: HashMap<String, Asset>,
    domains: HashMap<String, Domain>,
    wallets: HashMap<String, Wallet>,
    account_wallets: HashMap<PublicKey, Vec<String>>,
    transactions: HashMap<PublicKey, Vec<SignedTransaction>>,
}

/// World state kept in memory.
#[derive(Default)]
pub struct InMemoryWorldState {
    tables: RwLock<Tables>,
}

impl InMemoryWorldState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_account(&self, pub_key: PublicKey, account: Account) {
        self.tables.write().accounts.insert(pub_key, account);
    }

    pub fn put_asset(&self, asset: Asset) {
        self.tables.write().assets.insert(asset.asset_id.clone(), asset);
    }

    pub fn put_domain(&self, domain: Domain) {
        self.tables
            .write()
            .domains
            .insert(domain.domain_id.clone(), domain);
    }

    /// Store a wallet and index it under its owner's key.
    pub fn put_wallet(&self, owner: PublicKey, wallet: Wallet) {
        let mut tables = self.tables.write();
        let ids = tables.account_wallets.entry(owner).or_default();
        if !ids.contains(&wallet.wallet_id) {
            ids.push(wallet.wallet_id.clone());
        }
        tables.wallets.insert(wallet.wallet_id.clone(), wallet);
    }

    /// Record a committed transaction under its creator.
    pub fn put_transaction(&self, transaction: SignedTransaction) {
        self.tables
            .write()
            .transactions
            .entry(transaction.creator)
            .or_default()
            .push(transaction);
    }
}

fn hex_key(pub_key: &PublicKey) -> String {
    pub_key.iter().map(|b| format!("{b:02x}")).collect()
}

impl QueryApi for InMemoryWorldState {
    fn get_account(&self, pub_key: &PublicKey) -> Result<Account, QueryError> {
        self.tables
            .read()
            .accounts
            .get(pub_key)
            .cloned()
            .ok_or_else(|| QueryError::NotFound(format!("account {}", hex_key(pub_key))))
    }

    fn get_asset(&self, asset_full_name: &str) -> Result<Asset, QueryError> {
        self.tables
            .read()
            .assets
            .get(asset_full_name)
            .cloned()
            .ok_or_else(|| QueryError::NotFound(format!("asset {asset_full_name}")))
    }

    fn get_domain(&self, domain_full_name: &str) -> Result<Domain, QueryError> {
        self.tables
            .read()
            .domains
            .get(domain_full_name)
            .cloned()
            .ok_or_else(|| QueryError::NotFound(format!("domain {domain_full_name}")))
    }

    fn get_wallet(&self, wallet_id: &str) -> Result<Wallet, QueryError> {
        self.tables
            .read()
            .wallets
            .get(wallet_id)
            .cloned()
            .ok_or_else(|| QueryError::NotFound(format!("wallet {wallet_id}")))
    }

    fn get_account_wallets(&self, pub_key: &PublicKey) -> Result<Vec<Wallet>, QueryError> {
        let tables = self.tables.read();
        if !tables.accounts.contains_key(pub_key) {
            return Err(QueryError::NotFound(format!("account {}", hex_key(pub_key))));
        }
        let ids = tables.account_wallets.get(pub_key);
        ids.into_iter()
            .flatten()
            .map(|id| {
                tables
                    .wallets
                    .get(id)
                    .cloned()
                    .ok_or_else(|| QueryError::DecodeFailed(format!("dangling wallet index {id}")))
            })
            .collect()
    }

    fn get_domain_assets(&self, domain_full_name: &str) -> Result<Vec<Asset>, QueryError> {
        let tables = self.tables.read();
        if !tables.domains.contains_key(domain_full_name) {
            return Err(QueryError::NotFound(format!("domain {domain_full_name}")));
        }
        let mut assets: Vec<Asset> = tables
            .assets
            .values()
            .filter(|asset| asset.domain_id == domain_full_name)
            .cloned()
            .collect();
        assets.sort_by(|a, b| a.asset_id.cmp(&b.asset_id));
        Ok(assets)
    }

    fn get_account_transactions(
        &self,
        pub_key: &PublicKey,
    ) -> Result<TransactionIter, QueryError> {
        let transactions = self
            .tables
            .read()
            .transactions
            .get(pub_key)
            .cloned()
            .unwrap_or_default();
        Ok(Box::new(transactions.into_iter()))
    }
}
