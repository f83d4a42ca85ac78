//! # Michael & Scott Lock-Free Queue
//!
//! Unbounded multi-producer multi-consumer FIFO built from a singly linked
//! list with atomic `head` and `tail` pointers and a dummy sentinel node.
//!
//! ```text
//!  head                               tail
//!   │                                  │
//!   ▼                                  ▼
//! [sentinel] ──next──→ [a] ──next──→ [b] ──next──→ null
//!  (no data)
//! ```
//!
//! ## Protocol
//!
//! - **enqueue**: CAS `tail.next` from null to the new node, then swing
//!   `tail` forward. Any thread that finds `tail.next` non-null helps by
//!   swinging `tail` before retrying, so a preempted enqueuer never blocks
//!   others.
//! - **try_dequeue**: CAS `head` from the sentinel to `sentinel.next`. The
//!   winner takes the payload out of the new sentinel and retires the old
//!   one.
//!
//! ## Memory Reclamation
//!
//! Retired nodes are handed to crossbeam's epoch collector and freed only
//! after every thread pinned at the time of retirement has unpinned. A
//! thread that loaded `head` just before it was swung can therefore still
//! dereference it safely, and a freed address cannot reappear under a
//! pending CAS, which rules out ABA.
//!
//! The payload is read after the winning `head` CAS rather than before it:
//! the node stays valid under the pin either way, and reading first would
//! let every losing thread make a bitwise copy of a value it does not own.
//!
//! ## Ordering
//!
//! Loads that gate a dereference are `Acquire`; the publishing CASes are
//! `Release`. Statistics counters are `Relaxed` and advisory.

use std::mem::MaybeUninit;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering::{Acquire, Relaxed, Release};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::epoch::{self, Atomic, Owned, Shared};
use crossbeam::utils::{Backoff, CachePadded};

/// Sleep slice once spinning and yielding are exhausted
const PARK_INTERVAL: Duration = Duration::from_micros(50);

struct Node<T> {
    /// Uninitialised in the sentinel, and again once the payload is taken
    data: MaybeUninit<T>,
    next: Atomic<Node<T>>,
}

impl<T> Node<T> {
    fn sentinel() -> Self {
        Self {
            data: MaybeUninit::uninit(),
            next: Atomic::null(),
        }
    }
}

/// Snapshot of queue counters, advisory only
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub enqueued: u64,
    pub dequeued: u64,
    pub depth: usize,
    /// Rejections at the high-water mark; zero for the raw queue
    pub dropped: u64,
}

pub struct LockFreeQueue<T> {
    head: CachePadded<Atomic<Node<T>>>,
    tail: CachePadded<Atomic<Node<T>>>,
    enqueued: CachePadded<AtomicU64>,
    dequeued: CachePadded<AtomicU64>,
}

// SAFETY: payloads move between threads by value; nodes are only reached
// through atomics under an epoch guard.
unsafe impl<T: Send> Send for LockFreeQueue<T> {}
unsafe impl<T: Send> Sync for LockFreeQueue<T> {}

impl<T> LockFreeQueue<T> {
    pub fn new() -> Self {
        let queue = Self {
            head: CachePadded::new(Atomic::null()),
            tail: CachePadded::new(Atomic::null()),
            enqueued: CachePadded::new(AtomicU64::new(0)),
            dequeued: CachePadded::new(AtomicU64::new(0)),
        };

        // SAFETY: the queue is not shared yet
        let guard = unsafe { epoch::unprotected() };
        let sentinel = Owned::new(Node::sentinel()).into_shared(guard);
        queue.head.store(sentinel, Relaxed);
        queue.tail.store(sentinel, Relaxed);
        queue
    }

    /// Append an item; never blocks and never fails
    pub fn enqueue(&self, item: T) {
        let guard = &epoch::pin();
        let node = Owned::new(Node {
            data: MaybeUninit::new(item),
            next: Atomic::null(),
        })
        .into_shared(guard);

        loop {
            let tail = self.tail.load(Acquire, guard);
            // SAFETY: tail is never null and cannot be freed while pinned
            let tail_ref = unsafe { tail.deref() };
            let next = tail_ref.next.load(Acquire, guard);

            if tail != self.tail.load(Acquire, guard) {
                continue;
            }

            if next.is_null() {
                if tail_ref
                    .next
                    .compare_exchange(Shared::null(), node, Release, Relaxed, guard)
                    .is_ok()
                {
                    // Another thread may already have swung tail for us
                    let _ = self.tail.compare_exchange(tail, node, Release, Relaxed, guard);
                    break;
                }
            } else {
                let _ = self.tail.compare_exchange(tail, next, Release, Relaxed, guard);
            }
        }

        self.enqueued.fetch_add(1, Relaxed);
    }

    /// Take the oldest item, or `None` when the queue is empty
    pub fn try_dequeue(&self) -> Option<T> {
        let guard = &epoch::pin();

        loop {
            let head = self.head.load(Acquire, guard);
            let tail = self.tail.load(Acquire, guard);
            // SAFETY: head is never null and cannot be freed while pinned
            let next = unsafe { head.deref() }.next.load(Acquire, guard);

            if head != self.head.load(Acquire, guard) {
                continue;
            }

            // SAFETY: non-null next is protected by the same guard
            let Some(next_ref) = (unsafe { next.as_ref() }) else {
                return None;
            };

            if head == tail {
                // tail is lagging behind a completed link
                let _ = self.tail.compare_exchange(tail, next, Release, Relaxed, guard);
                continue;
            }

            if self
                .head
                .compare_exchange(head, next, Release, Relaxed, guard)
                .is_ok()
            {
                // SAFETY: winning the CAS transfers the payload to this
                // thread; `next` is now the sentinel and its data is never
                // read again. The old head is unreachable for new readers.
                let item = unsafe { next_ref.data.assume_init_read() };
                unsafe { guard.defer_destroy(head) };
                self.dequeued.fetch_add(1, Relaxed);
                return Some(item);
            }
        }
    }

    /// Poll until an item arrives or `timeout` elapses
    ///
    /// Spins with exponential backoff, then yields, then sleeps in short
    /// slices until the deadline.
    pub fn dequeue_timeout(&self, timeout: Duration) -> Option<T> {
        if let Some(item) = self.try_dequeue() {
            return Some(item);
        }

        let deadline = Instant::now() + timeout;
        let backoff = Backoff::new();
        loop {
            if let Some(item) = self.try_dequeue() {
                return Some(item);
            }

            let now = Instant::now();
            if now >= deadline {
                return None;
            }

            if backoff.is_completed() {
                thread::sleep(PARK_INTERVAL.min(deadline - now));
            } else {
                backoff.snooze();
            }
        }
    }

    /// Best-effort depth from the enqueue and dequeue counters
    ///
    /// Eventually consistent under concurrency; use for monitoring and
    /// backpressure heuristics only.
    pub fn approximate_len(&self) -> usize {
        let enqueued = self.enqueued.load(Relaxed);
        let dequeued = self.dequeued.load(Relaxed);
        enqueued.saturating_sub(dequeued) as usize
    }

    /// True when the sentinel has no successor at the moment of the check
    pub fn is_empty(&self) -> bool {
        let guard = &epoch::pin();
        let head = self.head.load(Acquire, guard);
        // SAFETY: head is never null and cannot be freed while pinned
        unsafe { head.deref() }.next.load(Acquire, guard).is_null()
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            enqueued: self.enqueued.load(Relaxed),
            dequeued: self.dequeued.load(Relaxed),
            depth: self.approximate_len(),
            dropped: 0,
        }
    }
}

impl<T> Default for LockFreeQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for LockFreeQueue<T> {
    fn drop(&mut self) {
        // SAFETY: `&mut self` means no other thread can reach the nodes
        unsafe {
            let guard = epoch::unprotected();
            let sentinel = self.head.load(Relaxed, guard);
            let mut node = sentinel.deref().next.load(Relaxed, guard);
            drop(sentinel.into_owned());

            while let Some(node_ref) = node.as_ref() {
                let next = node_ref.next.load(Relaxed, guard);
                let mut owned = node.into_owned();
                owned.data.assume_init_drop();
                drop(owned);
                node = next;
            }
        }
    }
}

impl<T> std::fmt::Debug for LockFreeQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockFreeQueue")
            .field("stats", &self.stats())
            .finish()
    }
}
