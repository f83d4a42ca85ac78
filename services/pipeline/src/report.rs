//! End-of-run summary

use std::time::Duration;

use fix_codec::ChecksumStrategy;
use hotpath::LatencySnapshot;
use message_queue::{PoolStats, QueueStats};
use tracing::info;

#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Messages decoded and offered to the queue
    pub produced: u64,
    pub consumed: u64,
    /// Rejected at the high-water mark
    pub dropped: u64,
    pub decode_failures: u64,
    /// Consumed messages that failed header validation
    pub invalid_messages: u64,
    pub elapsed: Duration,
    /// Decode-to-consume latency
    pub latency: LatencySnapshot,
    pub pool: PoolStats,
    pub queue: QueueStats,
    pub checksum_strategy: ChecksumStrategy,
}

impl PipelineReport {
    /// Consumed messages per second
    pub fn throughput_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.consumed as f64 / secs
    }

    /// Every produced message was either consumed or counted as dropped
    pub fn is_balanced(&self) -> bool {
        self.produced == self.consumed + self.dropped
    }

    pub fn log(&self) {
        info!(
            produced = self.produced,
            consumed = self.consumed,
            dropped = self.dropped,
            decode_failures = self.decode_failures,
            invalid = self.invalid_messages,
            elapsed_ms = self.elapsed.as_millis() as u64,
            throughput_per_sec = self.throughput_per_sec() as u64,
            "Pipeline finished"
        );
        info!(
            p50_ns = self.latency.p50_ns,
            p99_ns = self.latency.p99_ns,
            max_ns = self.latency.max_ns,
            mean_ns = self.latency.mean_ns,
            samples = self.latency.count,
            "Decode-to-consume latency"
        );
        info!(
            hit_rate = format!("{:.1}%", self.pool.hit_rate()),
            hits = self.pool.hits,
            misses = self.pool.misses,
            discarded = self.pool.discarded,
            available = self.pool.available,
            checksum = self.checksum_strategy.name(),
            "Pool and codec"
        );
    }
}
