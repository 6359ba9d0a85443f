//! Typed method descriptors.
//!
//! A descriptor pairs a method name with its request and response types. The
//! dispatcher itself only sees names and bytes; the types are enforced at
//! registration and at the client.

use std::fmt;
use std::marker::PhantomData;

/// Name plus request/response types of one RPC method.
pub struct MethodDescriptor<Req, Resp> {
    name: &'static str,
    _types: PhantomData<fn(Req) -> Resp>,
}

impl<Req, Resp> MethodDescriptor<Req, Resp> {
    /// Declare a method. Names are conventionally `service.Method`.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _types: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<Req, Resp> Clone for MethodDescriptor<Req, Resp> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Req, Resp> Copy for MethodDescriptor<Req, Resp> {}

impl<Req, Resp> fmt::Debug for MethodDescriptor<Req, Resp> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MethodDescriptor").field(&self.name).finish()
    }
}
