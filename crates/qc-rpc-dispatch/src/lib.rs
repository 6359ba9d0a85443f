//! # RPC Dispatch
//!
//! Asynchronous call handling off a single completion queue.
//!
//! ## Architecture
//!
//! - **Domain**: `Call` lifecycle state machine, tags, status codes, method descriptors
//! - **Ports**: Inbound `ServiceHandler` (per-method business logic)
//! - **Application**: `Dispatcher` (call registry + worker loop), `Responder`
//! - **Adapters**: In-process `CompletionQueue` transport and `RpcClient`
//!
//! ## Call Flow
//!
//! ```text
//! RpcClient ──start_call──→ CompletionQueue ──Completion{tag}──→ Dispatcher worker
//!                                 ↑                                   │
//!                                 │                     resolve tag → Call
//!                                 │                     re-arm replacement Call
//!                                 │                     spawn ServiceHandler
//!                                 │                                   │
//!                                 └──────finish(response, tag)────Responder
//! ```
//!
//! A `Call` is owned by the dispatcher's registry from creation until the
//! queue reports its send-completion tag. Handlers never own a `Call`; they
//! get a borrowed `CallContext` and a single-use `Responder`.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use adapters::client::RpcClient;
pub use adapters::completion_queue::{Completion, CompletionQueue, RpcReply};
pub use application::dispatcher::{DispatchStats, DispatchSummary, Dispatcher, LifecycleEvent};
pub use application::responder::{CallContext, Responder};
pub use config::DispatchConfig;
pub use domain::call::{Call, CallId, CallState};
pub use domain::errors::{CallError, CodecError, DispatchError};
pub use domain::method::MethodDescriptor;
pub use domain::status::{Status, StatusCode};
pub use domain::tag::{Tag, TagKind};
pub use ports::inbound::{handler_fn, FnHandler, ServiceHandler};
