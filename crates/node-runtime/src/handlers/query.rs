//! # Query Handlers
//!
//! Serves the read-only world-state queries over RPC.
//!
//! ## Query Flow
//!
//! ```text
//! RpcClient ──query.GetAccount──→ Dispatcher
//!                                     │ spawns handler
//!                                     ▼
//!                           spawn_blocking(QueryApi getter)
//!                                     │
//!                 Ok(row) ────────────┴──────────── Err(QueryError)
//!                    │                                    │
//!              response payload                  NOT_FOUND / INTERNAL /
//!                                                     UNAVAILABLE
//! ```
//!
//! Getters are synchronous row fetches, so they run on the blocking pool and
//! never on a dispatch worker.

use qc_rpc_dispatch::{handler_fn, DispatchError, Dispatcher, MethodDescriptor, Status};
use serde::{Deserialize, Serialize};
use shared_types::{
    Account, Asset, Domain, PublicKey, QueryApi, QueryError, SignedTransaction, Wallet,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, error};

pub const GET_ACCOUNT: MethodDescriptor<AccountKey, Account> =
    MethodDescriptor::new("query.GetAccount");
pub const GET_ASSET: MethodDescriptor<ObjectId, Asset> = MethodDescriptor::new("query.GetAsset");
pub const GET_DOMAIN: MethodDescriptor<ObjectId, Domain> = MethodDescriptor::new("query.GetDomain");
pub const GET_WALLET: MethodDescriptor<ObjectId, Wallet> = MethodDescriptor::new("query.GetWallet");
pub const GET_ACCOUNT_WALLETS: MethodDescriptor<AccountKey, Vec<Wallet>> =
    MethodDescriptor::new("query.GetAccountWallets");
pub const GET_DOMAIN_ASSETS: MethodDescriptor<ObjectId, Vec<Asset>> =
    MethodDescriptor::new("query.GetDomainAssets");
pub const GET_ACCOUNT_TRANSACTIONS: MethodDescriptor<AccountKey, Vec<SignedTransaction>> =
    MethodDescriptor::new("query.GetAccountTransactions");

/// Request keyed by an account's public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountKey {
    pub pub_key: PublicKey,
}

/// Request keyed by a full object name (asset, domain or wallet id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectId {
    pub id: String,
}

impl ObjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Map a backend failure to the status returned to the caller.
pub fn query_error_to_status(err: QueryError) -> Status {
    match err {
        QueryError::NotFound(what) => Status::not_found(what),
        QueryError::DecodeFailed(reason) => Status::internal(reason),
        QueryError::Unavailable(reason) => Status::unavailable(reason),
    }
}

/// Run a getter on the blocking pool.
async fn run_query<T, F>(api: Arc<dyn QueryApi>, query: F) -> Result<T, Status>
where
    T: Send + 'static,
    F: FnOnce(&dyn QueryApi) -> Result<T, QueryError> + Send + 'static,
{
    match tokio::task::spawn_blocking(move || query(api.as_ref())).await {
        Ok(result) => result.map_err(|e| {
            debug!(error = %e, "Query failed");
            query_error_to_status(e)
        }),
        Err(e) => {
            error!(error = %e, "Query task failed");
            Err(Status::internal("query task failed"))
        }
    }
}

type QueryFuture<T> = Pin<Box<dyn Future<Output = Result<T, Status>> + Send>>;

/// Build a handler that answers `Req` with `query(api, req)`.
fn query_handler<Req, T, F>(
    api: &Arc<dyn QueryApi>,
    query: F,
) -> impl Fn(Req) -> QueryFuture<T> + Send + Sync + 'static
where
    Req: Send + 'static,
    T: Send + 'static,
    F: Fn(&dyn QueryApi, Req) -> Result<T, QueryError> + Copy + Send + Sync + 'static,
{
    let api = Arc::clone(api);
    move |request: Req| -> QueryFuture<T> {
        let api = Arc::clone(&api);
        Box::pin(run_query(api, move |q| query(q, request)))
    }
}

/// Register every `query.*` method on the dispatcher.
pub fn register_query_service(
    dispatcher: &Dispatcher,
    api: Arc<dyn QueryApi>,
) -> Result<(), DispatchError> {
    dispatcher.register_method(
        GET_ACCOUNT,
        handler_fn(query_handler(&api, |q, req: AccountKey| {
            q.get_account(&req.pub_key)
        })),
    )?;
    dispatcher.register_method(
        GET_ASSET,
        handler_fn(query_handler(&api, |q, req: ObjectId| q.get_asset(&req.id))),
    )?;
    dispatcher.register_method(
        GET_DOMAIN,
        handler_fn(query_handler(&api, |q, req: ObjectId| q.get_domain(&req.id))),
    )?;
    dispatcher.register_method(
        GET_WALLET,
        handler_fn(query_handler(&api, |q, req: ObjectId| q.get_wallet(&req.id))),
    )?;
    dispatcher.register_method(
        GET_ACCOUNT_WALLETS,
        handler_fn(query_handler(&api, |q, req: AccountKey| {
            q.get_account_wallets(&req.pub_key)
        })),
    )?;
    dispatcher.register_method(
        GET_DOMAIN_ASSETS,
        handler_fn(query_handler(&api, |q, req: ObjectId| {
            q.get_domain_assets(&req.id)
        })),
    )?;
    dispatcher.register_method(
        GET_ACCOUNT_TRANSACTIONS,
        handler_fn(query_handler(&api, |q, req: AccountKey| {
            q.get_account_transactions(&req.pub_key)
                .map(|transactions| transactions.collect::<Vec<_>>())
        })),
    )?;
    Ok(())
}
