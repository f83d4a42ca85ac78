//! Producer/consumer orchestration

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use fix_codec::{checksum_strategy, encode_into, DecodePolicy, Decoder};
use fix_types::{tags, Message};
use hotpath::{high_resolution_timestamp_ns, pin_to_core_set, LatencyRecorder};
use message_queue::{BoundedQueue, MessagePool, PooledWrapper, QueueError};
use pipeline_config::PipelineConfig;
use tracing::{debug, info, warn};

use crate::report::PipelineReport;

/// Latency samples retained for percentile reporting
const LATENCY_RING_SIZE: usize = 1 << 16;

/// Samples retained by each consumer before merging at report time
const CONSUMER_RING_SIZE: usize = 1 << 14;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub producers: usize,
    pub consumers: usize,
    pub messages_per_producer: u64,
    /// Consumer poll deadline before re-checking for shutdown
    pub recv_timeout: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            producers: 2,
            consumers: 2,
            messages_per_producer: 100_000,
            recv_timeout: Duration::from_millis(50),
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    produced: AtomicU64,
    consumed: AtomicU64,
    decode_failures: AtomicU64,
    invalid: AtomicU64,
}

/// NewOrderSingle from producer `producer` with sequence `seq`
pub fn sample_order(producer: usize, seq: u32) -> Message {
    Message::builder("FIX.4.2", tags::msg_type::NEW_ORDER_SINGLE)
        .sender_comp_id(format!("PRODUCER{producer}"))
        .target_comp_id("PIPELINE")
        .msg_seq_num(seq)
        .field(tags::CL_ORD_ID, format!("{producer}-{seq}"))
        .field(tags::SYMBOL, "AAPL")
        .field(tags::SIDE, "1")
        .field(tags::ORDER_QTY, "100")
        .field(tags::ORD_TYPE, "2")
        .field(tags::PRICE, "187.25")
        .build()
}

/// Run the loopback pipeline to completion
pub fn run(config: &PipelineConfig, options: &RunOptions) -> Result<PipelineReport> {
    if options.producers == 0 || options.consumers == 0 {
        return Err(anyhow!("producers and consumers must both be at least 1"));
    }
    let seq_limit = u64::from(u32::MAX);
    if options.messages_per_producer > seq_limit {
        return Err(anyhow!("messages_per_producer exceeds the MsgSeqNum range"));
    }

    let queue_settings = &config.queue;
    let queue: BoundedQueue<Box<PooledWrapper>> = BoundedQueue::new(queue_settings.max_queue_depth);
    let pool = MessagePool::new(
        queue_settings.pool_preallocate,
        queue_settings.pool_max_size,
        queue_settings.wrapper_capacity,
    );
    let decoder = Decoder::new(DecodePolicy::from_flags(
        config.codec.verify_checksum,
        config.codec.strict_duplicate_tags,
    ));
    let latency = LatencyRecorder::new(LATENCY_RING_SIZE);
    let counters = Counters::default();
    let cores: &[usize] = if config.affinity.enabled {
        &config.affinity.cores
    } else {
        &[]
    };

    info!(
        producers = options.producers,
        consumers = options.consumers,
        messages_per_producer = options.messages_per_producer,
        max_queue_depth = queue_settings.max_queue_depth,
        checksum = checksum_strategy().name(),
        pinning = !cores.is_empty(),
        "Starting pipeline"
    );

    let started = Instant::now();

    thread::scope(|scope| -> Result<()> {
        let mut consumers = Vec::with_capacity(options.consumers);
        for index in 0..options.consumers {
            let (queue, pool, counters) = (&queue, &pool, &counters);
            let handle = thread::Builder::new()
                .name(format!("consumer-{index}"))
                .spawn_scoped(scope, move || {
                    if !cores.is_empty() {
                        pin_to_core_set(cores, index);
                    }
                    consume(queue, pool, counters, options.recv_timeout)
                });
            match handle {
                Ok(handle) => consumers.push(handle),
                Err(e) => {
                    // already running consumers exit once they see the close
                    queue.close();
                    return Err(e).context("Failed to spawn consumer thread");
                }
            }
        }

        let mut producers = Vec::with_capacity(options.producers);
        for index in 0..options.producers {
            let (queue, pool, decoder, counters) = (&queue, &pool, &decoder, &counters);
            let handle = thread::Builder::new()
                .name(format!("producer-{index}"))
                .spawn_scoped(scope, move || {
                    produce(index, options.messages_per_producer, queue, pool, decoder, counters);
                });
            match handle {
                Ok(handle) => producers.push(handle),
                Err(e) => {
                    // consumers would otherwise wait forever for the close
                    queue.close();
                    return Err(e).context("Failed to spawn producer thread");
                }
            }
        }

        let mut panicked = false;
        for handle in producers {
            panicked |= handle.join().is_err();
        }
        queue.close();
        for handle in consumers {
            match handle.join() {
                Ok(recorded) => latency.merge(&recorded),
                Err(_) => panicked = true,
            }
        }

        if panicked {
            return Err(anyhow!("pipeline worker thread panicked"));
        }
        Ok(())
    })?;

    let report = PipelineReport {
        produced: counters.produced.load(Ordering::Relaxed),
        consumed: counters.consumed.load(Ordering::Relaxed),
        dropped: queue.dropped(),
        decode_failures: counters.decode_failures.load(Ordering::Relaxed),
        invalid_messages: counters.invalid.load(Ordering::Relaxed),
        elapsed: started.elapsed(),
        latency: latency.snapshot(),
        pool: pool.stats(),
        queue: queue.stats(),
        checksum_strategy: checksum_strategy(),
    };
    report.log();
    Ok(report)
}

fn produce(
    producer: usize,
    count: u64,
    queue: &BoundedQueue<Box<PooledWrapper>>,
    pool: &MessagePool,
    decoder: &Decoder,
    counters: &Counters,
) {
    for seq in 1..=count {
        // bounded by the MsgSeqNum range check in `run`
        let seq = seq as u32;
        let outbound = sample_order(producer, seq);

        let mut wrapper = pool.rent();
        encode_into(&outbound, wrapper.buffer_mut());

        match decoder.decode(wrapper.bytes()) {
            Ok(inbound) => {
                wrapper.set_hardware_timestamp(inbound.hardware_timestamp());
                wrapper.set_message(inbound);
            }
            Err(e) => {
                counters.decode_failures.fetch_add(1, Ordering::Relaxed);
                warn!(producer, seq, error = %e, "Decode failed, message discarded");
                pool.release(wrapper);
                continue;
            }
        }

        counters.produced.fetch_add(1, Ordering::Relaxed);
        if let Err(full) = queue.try_enqueue(wrapper) {
            pool.release(full.into_inner());
        }
    }
    debug!(producer, count, "Producer finished");
}

/// Drain the queue until it is closed and empty, returning this consumer's latencies
fn consume(
    queue: &BoundedQueue<Box<PooledWrapper>>,
    pool: &MessagePool,
    counters: &Counters,
    recv_timeout: Duration,
) -> LatencyRecorder {
    let mut latency = LatencyRecorder::new(CONSUMER_RING_SIZE);
    let mut received = 0u64;
    loop {
        match queue.recv_timeout(recv_timeout) {
            Ok(mut wrapper) => {
                latency.record_between_exclusive(wrapper.hardware_timestamp(), high_resolution_timestamp_ns());

                match wrapper.take_message() {
                    Some(message) => {
                        if let Err(e) = message.validate() {
                            counters.invalid.fetch_add(1, Ordering::Relaxed);
                            debug!(error = %e, "Invalid message received");
                        }
                    }
                    None => {
                        counters.invalid.fetch_add(1, Ordering::Relaxed);
                    }
                }

                pool.release(wrapper);
                counters.consumed.fetch_add(1, Ordering::Relaxed);
                received += 1;
            }
            Err(QueueError::Timeout) => continue,
            Err(QueueError::Disconnected) => break,
        }
    }
    debug!(received, "Consumer drained");
    latency
}
