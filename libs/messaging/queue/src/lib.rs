//! # Message Queue
//!
//! ## Purpose
//!
//! Moves FIX messages between producer and consumer threads without locks
//! on the hot path:
//! - [`LockFreeQueue`]: unbounded Michael & Scott MPMC queue with epoch
//!   reclamation and cache-padded head/tail
//! - [`BoundedQueue`]: high-water-mark backpressure and close/drain
//!   signalling on top of it
//! - [`MessagePool`]: free list of reusable [`PooledWrapper`] carriers
//!
//! ## Architecture Role
//!
//! ```text
//! producers ──rent──→ [MessagePool]                  consumers
//!     │                     ↑                            ↑
//!     └─ fill ─→ [BoundedQueue → LockFreeQueue] ─dequeue─┘
//!                                                        │
//!                       release ←────────────────────────┘
//! ```
//!
//! ## Ordering
//!
//! FIFO holds per producer. Items from different producers interleave in
//! whatever order their enqueues linearise; callers needing global order
//! must use a single producer.

pub mod bounded;
pub mod error;
pub mod lockfree_queue;
pub mod pool;

pub use bounded::BoundedQueue;
pub use error::{QueueError, QueueFull};
pub use lockfree_queue::{LockFreeQueue, QueueStats};
pub use pool::{MessagePool, PoolStats, PooledWrapper};
