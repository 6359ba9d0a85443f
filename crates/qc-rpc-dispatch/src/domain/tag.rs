//! Completion tags.
//!
//! A tag is the opaque token the completion queue hands back when an
//! asynchronous operation finishes. Tags come from a monotonically increasing
//! counter and are never reused.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque token correlating a completion-queue event with the call awaiting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(u64);

impl Tag {
    /// Wrap a raw tag value.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw tag value.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tag#{}", self.0)
    }
}

/// Which operation of a call a tag stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagKind {
    /// The call was matched with an incoming request.
    RequestReceived,
    /// The call's response finished sending.
    ResponseSent,
}

/// Source of fresh tags. Not thread-safe by itself; lives inside the registry lock.
#[derive(Debug)]
pub struct TagAllocator {
    next: u64,
}

impl TagAllocator {
    /// Start allocating at 1; 0 is never handed out.
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Allocate the next unused tag.
    pub fn allocate(&mut self) -> Tag {
        let tag = Tag(self.next);
        self.next += 1;
        tag
    }
}

impl Default for TagAllocator {
    fn default() -> Self {
        Self::new()
    }
}
