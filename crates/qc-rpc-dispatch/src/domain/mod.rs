//! Domain module for RPC dispatch
//!
//! Call state machine, completion tags, status codes and method descriptors.

pub mod call;
pub mod codec;
pub mod errors;
pub mod method;
pub mod status;
pub mod tag;

pub use call::{Call, CallId, CallState};
pub use errors::*;
pub use method::MethodDescriptor;
pub use status::{Status, StatusCode};
pub use tag::{Tag, TagKind};
