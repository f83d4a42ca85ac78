//! # High-Water-Mark Backpressure
//!
//! [`BoundedQueue`] wraps the unbounded [`LockFreeQueue`] with an
//! application-level depth limit. Once the approximate depth reaches
//! `max_depth`, enqueue attempts are rejected with [`QueueFull`] and counted
//! as dropped; draining re-enables enqueue.
//!
//! The limit is checked against the approximate depth, so concurrent
//! producers can overshoot it by at most one item each.
//!
//! Producers [`close`](BoundedQueue::close) the queue when done; consumers
//! then see [`QueueError::Disconnected`] once it is drained.

use std::sync::atomic::Ordering::{Acquire, Relaxed, Release};
use std::sync::atomic::{AtomicBool, AtomicU64};
use std::time::Duration;

use crossbeam::utils::CachePadded;
use tracing::{debug, warn};

use crate::error::{QueueError, QueueFull};
use crate::lockfree_queue::{LockFreeQueue, QueueStats};

#[derive(Debug)]
pub struct BoundedQueue<T> {
    inner: LockFreeQueue<T>,
    max_depth: usize,
    dropped: CachePadded<AtomicU64>,
    closed: AtomicBool,
}

impl<T> BoundedQueue<T> {
    pub fn new(max_depth: usize) -> Self {
        Self {
            inner: LockFreeQueue::new(),
            max_depth,
            dropped: CachePadded::new(AtomicU64::new(0)),
            closed: AtomicBool::new(false),
        }
    }

    /// Enqueue unless the high-water mark has been reached
    pub fn try_enqueue(&self, item: T) -> Result<(), QueueFull<T>> {
        let depth = self.inner.approximate_len();
        if depth >= self.max_depth {
            let dropped = self.dropped.fetch_add(1, Relaxed) + 1;
            // log at powers of two so a sustained burst does not flood the log
            if dropped.is_power_of_two() {
                warn!(
                    depth,
                    max_depth = self.max_depth,
                    dropped,
                    "Queue at high-water mark, rejecting enqueue"
                );
            }
            return Err(QueueFull::new(item, depth));
        }

        self.inner.enqueue(item);
        Ok(())
    }

    pub fn try_dequeue(&self) -> Option<T> {
        self.inner.try_dequeue()
    }

    pub fn dequeue_timeout(&self, timeout: Duration) -> Option<T> {
        self.inner.dequeue_timeout(timeout)
    }

    /// Deadline receive that distinguishes "nothing yet" from "finished"
    pub fn recv_timeout(&self, timeout: Duration) -> Result<T, QueueError> {
        if self.is_closed() {
            return self.inner.try_dequeue().ok_or(QueueError::Disconnected);
        }

        match self.inner.dequeue_timeout(timeout) {
            Some(item) => Ok(item),
            // items enqueued before close are visible once close is observed
            None if self.is_closed() => self.inner.try_dequeue().ok_or(QueueError::Disconnected),
            None => Err(QueueError::Timeout),
        }
    }

    /// Signal that no further items will be enqueued
    pub fn close(&self) {
        if !self.closed.swap(true, Release) {
            debug!(depth = self.inner.approximate_len(), "Queue closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Acquire)
    }

    pub fn approximate_len(&self) -> usize {
        self.inner.approximate_len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Total rejections since construction
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Relaxed)
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            dropped: self.dropped(),
            ..self.inner.stats()
        }
    }
}
