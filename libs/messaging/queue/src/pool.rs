//! # Message Pool
//!
//! Recycles [`PooledWrapper`] carriers so that steady-state traffic performs
//! no heap allocation once the pool is warm.
//!
//! ```text
//!  rent() ──→ producer fills ──→ queue ──→ consumer drains ──→ release()
//!    ↑                                                            │
//!    └──────────────────────── free list ←────────────────────────┘
//! ```
//!
//! `rent` never blocks and never fails: an empty free list degrades to a
//! fresh allocation. `release` takes the wrapper by value, so a wrapper can
//! only be returned once. Wrappers beyond `max_size` are discarded instead
//! of returned.

use std::sync::atomic::Ordering::{AcqRel, Acquire, Relaxed};
use std::sync::atomic::{AtomicU64, AtomicUsize};

use fix_types::Message;
use tracing::debug;

/// Wrapper buffers that grew beyond this multiple of the configured
/// capacity are shrunk on release
const OVERSIZE_FACTOR: usize = 8;

/// Reusable carrier: encoded bytes, latency stamp, optional decoded message
#[derive(Debug, Default)]
pub struct PooledWrapper {
    buffer: Vec<u8>,
    hardware_timestamp: i64,
    message: Option<Message>,
}

impl PooledWrapper {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Raw bytes currently held
    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Growable buffer for encoders that append in place
    pub fn buffer_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buffer
    }

    /// Replace the held bytes with a copy of `bytes`
    pub fn fill_from(&mut self, bytes: &[u8]) {
        self.buffer.clear();
        self.buffer.extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn hardware_timestamp(&self) -> i64 {
        self.hardware_timestamp
    }

    pub fn set_hardware_timestamp(&mut self, timestamp: i64) {
        self.hardware_timestamp = timestamp;
    }

    pub fn message(&self) -> Option<&Message> {
        self.message.as_ref()
    }

    pub fn set_message(&mut self, message: Message) {
        self.message = Some(message);
    }

    pub fn take_message(&mut self) -> Option<Message> {
        self.message.take()
    }

    /// Clear contents, keeping the buffer allocation
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.hardware_timestamp = 0;
        self.message = None;
    }
}

#[derive(Debug, Default)]
struct PoolCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    returns: AtomicU64,
    discarded: AtomicU64,
}

/// Snapshot of pool counters, advisory only
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub hits: u64,
    pub misses: u64,
    pub returns: u64,
    pub discarded: u64,
    pub available: usize,
}

impl PoolStats {
    /// Percentage of rents served from the free list
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        (self.hits as f64 / total as f64) * 100.0
    }
}

pub struct MessagePool {
    free: lockfree::queue::Queue<Box<PooledWrapper>>,
    available: AtomicUsize,
    max_size: usize,
    wrapper_capacity: usize,
    counters: PoolCounters,
}

impl MessagePool {
    /// Pre-allocate `preallocate` wrappers (capped at `max_size`)
    pub fn new(preallocate: usize, max_size: usize, wrapper_capacity: usize) -> Self {
        let pool = Self {
            free: lockfree::queue::Queue::new(),
            available: AtomicUsize::new(0),
            max_size,
            wrapper_capacity,
            counters: PoolCounters::default(),
        };

        let count = preallocate.min(max_size);
        for _ in 0..count {
            pool.free.push(Box::new(PooledWrapper::with_capacity(wrapper_capacity)));
        }
        pool.available.store(count, Relaxed);

        debug!(count, max_size, wrapper_capacity, "Message pool pre-allocated");
        pool
    }

    /// Take a wrapper from the free list, allocating when it is empty
    pub fn rent(&self) -> Box<PooledWrapper> {
        match self.free.pop() {
            Some(wrapper) => {
                self.available.fetch_sub(1, AcqRel);
                self.counters.hits.fetch_add(1, Relaxed);
                wrapper
            }
            None => {
                self.counters.misses.fetch_add(1, Relaxed);
                Box::new(PooledWrapper::with_capacity(self.wrapper_capacity))
            }
        }
    }

    /// Reset a wrapper and make it available again
    pub fn release(&self, mut wrapper: Box<PooledWrapper>) {
        if self.available.fetch_add(1, AcqRel) >= self.max_size {
            self.available.fetch_sub(1, AcqRel);
            self.counters.discarded.fetch_add(1, Relaxed);
            return;
        }

        wrapper.reset();
        if wrapper.capacity() > self.wrapper_capacity.saturating_mul(OVERSIZE_FACTOR) {
            wrapper.buffer.shrink_to(self.wrapper_capacity);
        }
        self.free.push(wrapper);
        self.counters.returns.fetch_add(1, Relaxed);
    }

    /// Wrappers currently on the free list
    pub fn available(&self) -> usize {
        self.available.load(Acquire)
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            hits: self.counters.hits.load(Relaxed),
            misses: self.counters.misses.load(Relaxed),
            returns: self.counters.returns.load(Relaxed),
            discarded: self.counters.discarded.load(Relaxed),
            available: self.available(),
        }
    }
}

impl std::fmt::Debug for MessagePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessagePool")
            .field("max_size", &self.max_size)
            .field("wrapper_capacity", &self.wrapper_capacity)
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_preallocated_wrappers_are_hits() {
        let pool = MessagePool::new(2, 4, 64);
        assert_eq!(pool.available(), 2);

        let a = pool.rent();
        let b = pool.rent();
        let c = pool.rent();
        assert!(a.capacity() >= 64);

        let stats = pool.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.available, 0);

        pool.release(a);
        pool.release(b);
        pool.release(c);
        assert_eq!(pool.available(), 3);
        assert_eq!(pool.stats().returns, 3);
    }

    #[test]
    fn test_release_resets_wrapper() {
        let pool = MessagePool::new(1, 1, 16);
        let mut wrapper = pool.rent();
        wrapper.fill_from(b"8=FIX.4.2\x01");
        wrapper.set_hardware_timestamp(123);
        wrapper.set_message(Message::builder("FIX.4.2", "0").build());
        pool.release(wrapper);

        let wrapper = pool.rent();
        assert!(wrapper.is_empty());
        assert_eq!(wrapper.hardware_timestamp(), 0);
        assert!(wrapper.message().is_none());
    }

    #[test]
    fn test_discards_beyond_max_size() {
        let pool = MessagePool::new(0, 1, 16);
        let a = pool.rent();
        let b = pool.rent();
        pool.release(a);
        pool.release(b);

        let stats = pool.stats();
        assert_eq!(stats.available, 1);
        assert_eq!(stats.returns, 1);
        assert_eq!(stats.discarded, 1);
    }

    #[test]
    fn test_oversized_buffer_shrunk() {
        let pool = MessagePool::new(0, 4, 16);
        let mut wrapper = pool.rent();
        wrapper.fill_from(&vec![0u8; 4096]);
        pool.release(wrapper);

        assert!(pool.rent().capacity() < 4096);
    }

    #[test]
    fn test_hit_rate() {
        let stats = PoolStats {
            hits: 3,
            misses: 1,
            ..PoolStats::default()
        };
        assert!((stats.hit_rate() - 75.0).abs() < f64::EPSILON);
        assert_eq!(PoolStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_concurrent_rent_release() {
        let pool = Arc::new(MessagePool::new(16, 16, 32));
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || {
                    for i in 0..1_000 {
                        let mut wrapper = pool.rent();
                        wrapper.set_hardware_timestamp(i);
                        pool.release(wrapper);
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let stats = pool.stats();
        assert_eq!(stats.hits + stats.misses, 4_000);
        assert_eq!(stats.returns + stats.discarded, 4_000);
        assert!(stats.available <= 16);
    }
}
