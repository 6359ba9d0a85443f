//! Inbound Ports (Driving Ports / API)
//!
//! Service handlers hold the business logic of one RPC method. The
//! dispatcher stores them type-erased in a method table so every method goes
//! through the same routing path.

use crate::application::responder::{CallContext, RawResponder, Responder};
use crate::domain::codec;
use crate::domain::status::Status;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::marker::PhantomData;
use tracing::warn;

/// Business logic for one RPC method.
///
/// Invoked once per received request with the decoded request and a
/// single-use [`Responder`]. The handler may do further asynchronous work
/// before responding; it runs on its own task, never on a dispatch worker.
#[async_trait]
pub trait ServiceHandler<Req, Resp>: Send + Sync + 'static
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    async fn handle(&self, ctx: &CallContext, request: Req, responder: Responder<Resp>);
}

/// Adapter turning an async closure `Req -> Result<Resp, Status>` into a handler.
pub struct FnHandler<F>(F);

/// Build a handler from an async closure.
pub fn handler_fn<F>(f: F) -> FnHandler<F> {
    FnHandler(f)
}

#[async_trait]
impl<Req, Resp, F, Fut> ServiceHandler<Req, Resp> for FnHandler<F>
where
    Req: Send + 'static,
    Resp: Serialize + Send + 'static,
    F: Fn(Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Resp, Status>> + Send + 'static,
{
    async fn handle(&self, _ctx: &CallContext, request: Req, responder: Responder<Resp>) {
        let result = (self.0)(request).await;
        responder.send_result(result);
    }
}

/// Object-safe form of a handler: bytes in, responder out.
#[async_trait]
pub(crate) trait ErasedHandler: Send + Sync {
    async fn dispatch(&self, ctx: &CallContext, payload: Vec<u8>, responder: RawResponder);
}

/// Binds a typed handler to the byte-level dispatch path.
pub(crate) struct TypedHandler<Req, Resp, H> {
    handler: H,
    _types: PhantomData<fn(Req) -> Resp>,
}

impl<Req, Resp, H> TypedHandler<Req, Resp, H> {
    pub(crate) fn new(handler: H) -> Self {
        Self {
            handler,
            _types: PhantomData,
        }
    }
}

#[async_trait]
impl<Req, Resp, H> ErasedHandler for TypedHandler<Req, Resp, H>
where
    Req: DeserializeOwned + Send + 'static,
    Resp: Serialize + Send + 'static,
    H: ServiceHandler<Req, Resp>,
{
    async fn dispatch(&self, ctx: &CallContext, payload: Vec<u8>, responder: RawResponder) {
        let responder = Responder::<Resp>::new(responder);
        match codec::decode::<Req>(&payload) {
            Ok(request) => self.handler.handle(ctx, request, responder).await,
            Err(e) => {
                warn!(call_id = %ctx.call_id(), method = %ctx.method(), error = %e, "Rejecting undecodable request");
                responder.send_error(Status::invalid_argument(e.to_string()));
            }
        }
    }
}
