//! Hardware Clock - Monotonic Nanosecond Timestamps
//!
//! ## Purpose
//!
//! Every message carries a `hardware_timestamp` that is only ever used for
//! latency deltas (decode → enqueue → dequeue → processed). Those deltas must
//! be monotonic, so the source is the CPU's invariant counter read through
//! `quanta`, which calibrates the counter frequency once at startup and scales
//! raw ticks as `ticks * 1_000_000_000 / counter_frequency`.
//!
//! ## Why Not Wall Clock
//!
//! ```text
//! SystemTime:   t0 = 10:00:00.000100   NTP step -5ms   t1 = 09:59:59.995200
//!               latency = t1 - t0 = -4.9ms   ← impossible, corrupts percentiles
//!
//! Hardware:     ticks only move forward; a slew or step never reaches here
//! ```
//!
//! ## Performance Profile
//!
//! - **Read**: one `rdtsc` (or `cntvct_el0`) plus a multiply/shift, ~10-20ns
//! - **Syscalls**: none after calibration
//! - **Origin**: timestamps count from the clock's creation, not from an epoch
//!
//! ## Usage
//!
//! ```rust
//! use hotpath::time::{high_resolution_timestamp_ns, elapsed_ns};
//!
//! let start = high_resolution_timestamp_ns();
//! // ... decode a message ...
//! let latency = elapsed_ns(start);
//! assert!(latency >= 0);
//! ```

use quanta::Clock;
use std::fmt;
use std::sync::OnceLock;

/// Process-wide clock shared by every stamping site
static GLOBAL_CLOCK: OnceLock<HardwareClock> = OnceLock::new();

/// A calibrated monotonic counter anchored at its creation instant
///
/// Cloning is cheap and clones share the same origin, so timestamps taken
/// through any clone are directly comparable.
#[derive(Clone)]
pub struct HardwareClock {
    clock: Clock,
    origin: u64,
}

impl HardwareClock {
    /// Calibrate the platform counter and anchor the origin at "now"
    pub fn new() -> Self {
        Self::from_clock(Clock::new())
    }

    /// Wrap an existing `quanta` clock (a mocked one in tests)
    pub fn from_clock(clock: Clock) -> Self {
        let origin = clock.raw();
        Self { clock, origin }
    }

    /// Raw counter ticks, unscaled
    #[inline(always)]
    pub fn ticks(&self) -> u64 {
        self.clock.raw()
    }

    /// Scale a raw tick reading to nanoseconds since this clock's origin
    #[inline(always)]
    pub fn ticks_to_ns(&self, ticks: u64) -> i64 {
        if ticks <= self.origin {
            return 0;
        }
        let ns = self.clock.delta_as_nanos(self.origin, ticks);
        i64::try_from(ns).unwrap_or(i64::MAX)
    }

    /// Nanoseconds elapsed since this clock's origin
    #[inline(always)]
    pub fn now_ns(&self) -> i64 {
        self.ticks_to_ns(self.ticks())
    }
}

impl Default for HardwareClock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HardwareClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HardwareClock")
            .field("origin", &self.origin)
            .finish()
    }
}

/// The shared process clock, calibrated on first use
pub fn global_clock() -> &'static HardwareClock {
    GLOBAL_CLOCK.get_or_init(HardwareClock::new)
}

/// Monotonic nanosecond timestamp for latency measurement
///
/// Values are only meaningful relative to each other within one process.
#[inline(always)]
pub fn high_resolution_timestamp_ns() -> i64 {
    global_clock().now_ns()
}

/// Nanoseconds elapsed since `start_ns` (a value from [`high_resolution_timestamp_ns`])
#[inline(always)]
pub fn elapsed_ns(start_ns: i64) -> i64 {
    high_resolution_timestamp_ns().saturating_sub(start_ns).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_timestamps_never_go_backwards() {
        let mut previous = high_resolution_timestamp_ns();
        for _ in 0..10_000 {
            let now = high_resolution_timestamp_ns();
            assert!(now >= previous, "clock went backwards: {} < {}", now, previous);
            previous = now;
        }
    }

    #[test]
    fn test_timestamps_monotonic_across_threads() {
        let before = high_resolution_timestamp_ns();
        let from_thread = std::thread::spawn(high_resolution_timestamp_ns)
            .join()
            .unwrap();
        let after = high_resolution_timestamp_ns();

        assert!(from_thread >= before);
        assert!(after >= from_thread);
    }

    #[test]
    fn test_sleep_is_reflected_in_elapsed() {
        let start = high_resolution_timestamp_ns();
        std::thread::sleep(Duration::from_millis(5));
        let elapsed = elapsed_ns(start);

        // Allow generous slack for calibration error, never less than 4ms
        assert!(elapsed >= 4_000_000, "elapsed only {}ns", elapsed);
    }

    #[test]
    fn test_mock_clock_scaling() {
        let (clock, mock) = Clock::mock();
        let hw = HardwareClock::from_clock(clock);

        assert_eq!(hw.now_ns(), 0);

        mock.increment(Duration::from_micros(250));
        assert_eq!(hw.now_ns(), 250_000);

        mock.increment(1_500u64);
        assert_eq!(hw.now_ns(), 251_500);
    }

    #[test]
    fn test_ticks_before_origin_clamp_to_zero() {
        let (clock, mock) = Clock::mock();
        mock.increment(1_000u64);
        let hw = HardwareClock::from_clock(clock);

        assert_eq!(hw.ticks_to_ns(0), 0);
        assert_eq!(hw.ticks_to_ns(hw.ticks()), 0);
    }

    #[test]
    fn test_clones_share_origin() {
        let (clock, mock) = Clock::mock();
        let a = HardwareClock::from_clock(clock);
        let b = a.clone();

        mock.increment(42u64);
        assert_eq!(a.now_ns(), b.now_ns());
    }
}
