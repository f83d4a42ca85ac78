//! Latency sample recording
//!
//! A fixed-size ring of nanosecond samples. Shared writers claim a slot with
//! one atomic increment and take the lock for the slot write. A recorder
//! owned by a single thread records through `&mut self` with no lock at
//! all; per-thread recorders are folded together with
//! [`LatencyRecorder::merge`] when the run is reported.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Ring buffer of the most recent `capacity` latency samples
#[derive(Debug)]
pub struct LatencyRecorder {
    samples: Mutex<Vec<u64>>,
    /// Next ring slot; also the number of slots written so far
    cursor: AtomicU64,
    /// Samples ever recorded, including ones merged in from other recorders
    total: AtomicU64,
    capacity: usize,
}

/// Point-in-time summary of recorded latencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LatencySnapshot {
    /// Total samples ever recorded (may exceed the ring size)
    pub count: u64,
    pub p50_ns: u64,
    pub p99_ns: u64,
    pub max_ns: u64,
    pub mean_ns: u64,
}

impl LatencyRecorder {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: Mutex::new(vec![0; capacity]),
            cursor: AtomicU64::new(0),
            total: AtomicU64::new(0),
            capacity,
        }
    }

    /// Record one latency sample; negative values clamp to zero
    pub fn record_ns(&self, latency_ns: i64) {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.capacity as u64;
        self.total.fetch_add(1, Ordering::Relaxed);
        let mut samples = self.samples.lock();
        samples[index as usize] = latency_ns.max(0) as u64;
    }

    /// Record the delta between two hardware timestamps
    pub fn record_between(&self, start_ns: i64, end_ns: i64) {
        self.record_ns(end_ns.saturating_sub(start_ns));
    }

    /// Lock-free recording for a recorder owned by the calling thread
    #[inline]
    pub fn record_exclusive(&mut self, latency_ns: i64) {
        let cursor = self.cursor.get_mut();
        let index = (*cursor % self.capacity as u64) as usize;
        *cursor += 1;
        *self.total.get_mut() += 1;
        self.samples.get_mut()[index] = latency_ns.max(0) as u64;
    }

    #[inline]
    pub fn record_between_exclusive(&mut self, start_ns: i64, end_ns: i64) {
        self.record_exclusive(end_ns.saturating_sub(start_ns));
    }

    /// Fold another recorder's retained samples and total count into this one
    pub fn merge(&self, other: &LatencyRecorder) {
        let incoming = other.retained_samples();
        let mut samples = self.samples.lock();
        for latency in incoming {
            let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.capacity as u64;
            samples[index as usize] = latency;
        }
        self.total.fetch_add(other.count(), Ordering::Relaxed);
    }

    /// Total samples recorded so far
    pub fn count(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Latency at percentile `p` (0.0..=100.0) over the retained samples
    pub fn percentile(&self, p: f64) -> Option<u64> {
        let mut sorted = self.retained_samples();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_unstable();
        Some(percentile_of_sorted(&sorted, p))
    }

    pub fn snapshot(&self) -> LatencySnapshot {
        let count = self.count();
        let mut sorted = self.retained_samples();
        if sorted.is_empty() {
            return LatencySnapshot::default();
        }
        sorted.sort_unstable();

        let sum: u128 = sorted.iter().map(|&s| s as u128).sum();
        LatencySnapshot {
            count,
            p50_ns: percentile_of_sorted(&sorted, 50.0),
            p99_ns: percentile_of_sorted(&sorted, 99.0),
            max_ns: sorted[sorted.len() - 1],
            mean_ns: (sum / sorted.len() as u128) as u64,
        }
    }

    fn retained_samples(&self) -> Vec<u64> {
        let written = self.cursor.load(Ordering::Relaxed);
        let filled = usize::try_from(written).unwrap_or(usize::MAX).min(self.capacity);
        let samples = self.samples.lock();
        samples[..filled].to_vec()
    }
}

fn percentile_of_sorted(sorted: &[u64], p: f64) -> u64 {
    let p = p.clamp(0.0, 100.0);
    let rank = ((sorted.len() - 1) as f64 * p / 100.0).round() as usize;
    sorted[rank.min(sorted.len() - 1)]
}
