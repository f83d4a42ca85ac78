//! # Hot Path Instrumentation
//!
//! ## Purpose
//!
//! Hardware-level support for the message pipeline's latency budget:
//! - **Hardware clock**: nanosecond timestamps from the CPU's invariant
//!   counter, never from wall-clock time
//! - **Core affinity**: best-effort pinning of dedicated processing threads
//! - **Latency recording**: fixed-size sample ring with percentile queries
//!
//! ## Architecture Role
//!
//! ```text
//! fix-types / fix-codec ──→ [hotpath::time] ──→ Message.hardware_timestamp
//!                                  ↓
//! message-queue consumers ──→ [hotpath::latency] ──→ p50 / p99 reporting
//!          ↓
//!   [hotpath::affinity] ──→ sched_setaffinity (Linux) / no-op elsewhere
//! ```
//!
//! ## What This Crate Does NOT Contain
//! - Checksum vectorisation (belongs in the codec)
//! - Queue or pool structures (belong in messaging)

pub mod affinity;
pub mod error;
pub mod latency;
pub mod time;

pub use affinity::{
    available_cores, pin_to_core_set, platform_affinity, CoreAffinity, NoopAffinity,
};
#[cfg(target_os = "linux")]
pub use affinity::LinuxAffinity;
pub use error::AffinityError;
pub use latency::{LatencyRecorder, LatencySnapshot};
pub use time::{elapsed_ns, global_clock, high_resolution_timestamp_ns, HardwareClock};
