//! # FIX Pipeline
//!
//! Loopback soak harness wiring every crate together:
//!
//! ```text
//! producer ×P                                        consumer ×C (optionally pinned)
//! ─────────                                          ──────────
//! build Message                                      recv_timeout
//!   → encode_into(wrapper buffer)                      → latency = now - decode stamp
//!   → decode (policy from config)     BoundedQueue     → validate message
//!   → wrapper.set_message  ──try_enqueue──→ [ ] ──→    → pool.release(wrapper)
//!   (QueueFull → release, count drop)
//! ```
//!
//! [`run`] blocks until every producer has finished and consumers have
//! drained the queue, then returns a [`PipelineReport`].

pub mod report;
pub mod runner;

pub use report::PipelineReport;
pub use runner::{run, sample_order, RunOptions};
