//! PCS that forwards transactions to an ordering node over RPC.

use crate::domain::errors::PcsError;
use crate::ports::outbound::PeerCommunicationService;
use crate::rpc::payloads::{SubmitTransactionRequest, SUBMIT_TRANSACTION};
use async_trait::async_trait;
use qc_rpc_dispatch::{RpcClient, Status, StatusCode};
use shared_types::SignedTransaction;
use std::sync::Arc;
use tracing::debug;

/// Sends every transaction as one `ordering.SubmitTransaction` call.
pub struct RemoteOrderingPcs {
    client: RpcClient,
}

impl RemoteOrderingPcs {
    pub fn new(client: RpcClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PeerCommunicationService for RemoteOrderingPcs {
    async fn propagate_transaction(
        &self,
        transaction: Arc<SignedTransaction>,
    ) -> Result<(), PcsError> {
        let request = SubmitTransactionRequest {
            transaction: (*transaction).clone(),
        };
        let response = self
            .client
            .call(&SUBMIT_TRANSACTION, &request)
            .await
            .map_err(status_to_pcs_error)?;
        debug!(tx_hash = ?response.tx_hash, "[qc-12] Ordering node accepted transaction");
        Ok(())
    }
}

fn status_to_pcs_error(status: Status) -> PcsError {
    match status.code {
        StatusCode::Unavailable | StatusCode::ResourceExhausted | StatusCode::Internal => {
            PcsError::Unreachable(status.message)
        }
        _ => PcsError::Rejected(status.message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_statuses_are_unreachable() {
        assert_eq!(
            status_to_pcs_error(Status::unavailable("down")),
            PcsError::Unreachable("down".into())
        );
        assert_eq!(
            status_to_pcs_error(Status::resource_exhausted("busy")),
            PcsError::Unreachable("busy".into())
        );
    }

    #[test]
    fn test_other_statuses_are_rejections() {
        assert_eq!(
            status_to_pcs_error(Status::failed_precondition("duplicate")),
            PcsError::Rejected("duplicate".into())
        );
        assert_eq!(
            status_to_pcs_error(Status::unimplemented("no ordering here")),
            PcsError::Rejected("no ordering here".into())
        );
    }
}
