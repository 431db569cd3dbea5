//! The progress channel contract.
//!
//! The runner calls `send` exactly once per task list, keeps the handle, and
//! routes every later status change through `update` on that handle — one
//! visible message, edited in place.

use crate::task::TaskListSnapshot;
use async_trait::async_trait;
use std::fmt;

/// Opaque reference to the message created by `send`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHandle(String);

impl MessageHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[async_trait]
pub trait ProgressRenderer: Send + Sync {
    /// Create the visible progress message and return a handle to it.
    async fn send(&self, snapshot: &TaskListSnapshot) -> crate::Result<MessageHandle>;

    /// Edit the message identified by `handle` in place.
    async fn update(&self, handle: &MessageHandle, snapshot: &TaskListSnapshot)
        -> crate::Result<()>;
}
