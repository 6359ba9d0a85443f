//! Typed client over the in-process completion queue.

use crate::adapters::completion_queue::CompletionQueue;
use crate::domain::codec;
use crate::domain::method::MethodDescriptor;
use crate::domain::status::Status;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Client handle. Cheap to clone; all clones share the queue.
#[derive(Clone)]
pub struct RpcClient {
    queue: Arc<CompletionQueue>,
}

impl RpcClient {
    pub fn new(queue: Arc<CompletionQueue>) -> Self {
        Self { queue }
    }

    /// Perform one unary call and wait for its reply.
    pub async fn call<Req, Resp>(
        &self,
        method: &MethodDescriptor<Req, Resp>,
        request: &Req,
    ) -> Result<Resp, Status>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let payload =
            codec::encode(request).map_err(|e| Status::invalid_argument(e.to_string()))?;
        let reply = self.queue.start_call(method.name(), payload);

        let bytes = match reply.await {
            Ok(result) => result?,
            Err(_) => {
                debug!(method = method.name(), "Call dropped without a reply");
                return Err(Status::unavailable("call was dropped before a response was sent"));
            }
        };

        codec::decode(&bytes).map_err(|e| Status::internal(e.to_string()))
    }
}
