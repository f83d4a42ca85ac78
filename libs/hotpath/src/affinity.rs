//! CPU Core Affinity for Dedicated Processing Threads
//!
//! ## Purpose
//!
//! Pinning a consumer thread to one core keeps its working set (queue head,
//! pool free-list, decoded messages) in that core's L1/L2 and removes
//! scheduler migrations from the latency tail.
//!
//! ## Platform Support
//!
//! - **Linux**: `sched_setaffinity` through `nix::sched`
//! - **Everything else**: [`NoopAffinity`], pinning silently succeeds
//!
//! Pinning is best-effort everywhere. [`pin_to_core_set`] logs a failure
//! and returns `None`; the worker keeps running unpinned.
//!
//! ## Usage
//!
//! ```rust
//! use hotpath::affinity::pin_to_core_set;
//!
//! let cores = [2, 3];
//! std::thread::spawn(move || {
//!     let _pinned = pin_to_core_set(&cores, 0);
//!     // ... drain the queue ...
//! });
//! ```

use crate::error::AffinityError;
use tracing::{debug, warn};

/// Platform seam for binding the calling thread to a single core
pub trait CoreAffinity: Send + Sync {
    /// Bind the calling thread to `core`
    fn pin_current_thread(&self, core: usize) -> Result<(), AffinityError>;

    /// Whether pinning has any effect on this platform
    fn is_supported(&self) -> bool;
}

/// Fallback for platforms without an affinity API
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAffinity;

impl CoreAffinity for NoopAffinity {
    fn pin_current_thread(&self, core: usize) -> Result<(), AffinityError> {
        debug!(core, "core affinity unavailable on this platform, continuing unpinned");
        Ok(())
    }

    fn is_supported(&self) -> bool {
        false
    }
}

/// `sched_setaffinity` backed pinning
#[cfg(target_os = "linux")]
#[derive(Debug, Default, Clone, Copy)]
pub struct LinuxAffinity;

#[cfg(target_os = "linux")]
impl CoreAffinity for LinuxAffinity {
    fn pin_current_thread(&self, core: usize) -> Result<(), AffinityError> {
        use nix::sched::{sched_setaffinity, CpuSet};
        use nix::unistd::Pid;

        let mut cpu_set = CpuSet::new();
        cpu_set.set(core).map_err(|_| AffinityError::InvalidCore {
            core,
            limit: CpuSet::count(),
        })?;

        // Pid 0 targets the calling thread
        sched_setaffinity(Pid::from_raw(0), &cpu_set).map_err(|errno| AffinityError::System {
            core,
            reason: errno.desc().to_string(),
        })
    }

    fn is_supported(&self) -> bool {
        true
    }
}

#[cfg(target_os = "linux")]
static PLATFORM_AFFINITY: LinuxAffinity = LinuxAffinity;

#[cfg(not(target_os = "linux"))]
static PLATFORM_AFFINITY: NoopAffinity = NoopAffinity;

/// The affinity implementation for the current target
pub fn platform_affinity() -> &'static dyn CoreAffinity {
    &PLATFORM_AFFINITY
}

/// Number of cores the process may schedule on
pub fn available_cores() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Pin the calling thread to `cores[worker_index % cores.len()]`
///
/// Returns the core actually pinned to, or `None` when the set is empty or
/// the platform refused. Failures are logged, never propagated.
pub fn pin_to_core_set(cores: &[usize], worker_index: usize) -> Option<usize> {
    pin_with(platform_affinity(), cores, worker_index)
}

/// [`pin_to_core_set`] against an explicit implementation
pub fn pin_with(
    affinity: &dyn CoreAffinity,
    cores: &[usize],
    worker_index: usize,
) -> Option<usize> {
    if cores.is_empty() {
        return None;
    }

    let core = cores[worker_index % cores.len()];
    match affinity.pin_current_thread(core) {
        Ok(()) if affinity.is_supported() => {
            debug!(core, worker_index, "pinned worker thread");
            Some(core)
        }
        Ok(()) => None,
        Err(e) => {
            warn!(core, worker_index, error = %e, "core pinning failed, worker continues unpinned");
            None
        }
    }
}
