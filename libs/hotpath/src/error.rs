//! Errors raised by platform-specific hot path facilities

use thiserror::Error;

/// Failure to pin a thread to a CPU core
///
/// Pinning is always best-effort: callers log these and keep running
/// unpinned rather than aborting the worker.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AffinityError {
    /// Core index cannot be represented in the platform CPU set
    #[error("core {core} is outside the addressable CPU set (limit {limit})")]
    InvalidCore { core: usize, limit: usize },

    /// Platform has no thread affinity API
    #[error("thread affinity is not supported on this platform")]
    Unsupported,

    /// The affinity syscall rejected the request
    #[error("failed to pin current thread to core {core}: {reason}")]
    System { core: usize, reason: String },
}
