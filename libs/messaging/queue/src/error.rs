//! Queue errors

use std::fmt;

use thiserror::Error;

/// Enqueue rejected at the high-water mark
///
/// Carries the rejected item back so the caller can count, log or retry it.
pub struct QueueFull<T> {
    item: T,
    depth: usize,
}

impl<T> QueueFull<T> {
    pub(crate) fn new(item: T, depth: usize) -> Self {
        Self { item, depth }
    }

    /// Approximate depth observed when the enqueue was rejected
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn into_inner(self) -> T {
        self.item
    }
}

impl<T> fmt::Debug for QueueFull<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueFull").field("depth", &self.depth).finish_non_exhaustive()
    }
}

impl<T> fmt::Display for QueueFull<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Queue full: depth {} at high-water mark", self.depth)
    }
}

impl<T> std::error::Error for QueueFull<T> {}

/// Deadline receive failures
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    #[error("Timed out waiting for a message")]
    Timeout,

    /// Queue closed by the producers and fully drained
    #[error("Queue closed and drained")]
    Disconnected,
}
