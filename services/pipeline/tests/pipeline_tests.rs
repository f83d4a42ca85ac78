//! End-to-end pipeline runs with small message counts

use std::io::Write;
use std::time::Duration;

use fix_codec::{decode, encode};
use fix_pipeline::{run, sample_order, RunOptions};
use fix_types::tags;
use pipeline_config::PipelineConfig;

fn options(producers: usize, consumers: usize, messages: u64) -> RunOptions {
    RunOptions {
        producers,
        consumers,
        messages_per_producer: messages,
        recv_timeout: Duration::from_millis(5),
    }
}

#[test]
fn test_every_message_accounted_for() {
    let config = PipelineConfig::default();
    let report = run(&config, &options(3, 2, 2_000)).unwrap();

    assert_eq!(report.produced, 6_000);
    assert_eq!(report.decode_failures, 0);
    assert_eq!(report.invalid_messages, 0);
    assert!(report.is_balanced());
    assert_eq!(report.dropped, 0);
    assert_eq!(report.latency.count, report.consumed);
}

#[test]
fn test_strict_policy_accepts_own_encoding() {
    let mut config = PipelineConfig::default();
    config.codec.verify_checksum = true;
    config.codec.strict_duplicate_tags = true;

    let report = run(&config, &options(2, 2, 1_000)).unwrap();
    assert_eq!(report.decode_failures, 0);
    assert_eq!(report.consumed + report.dropped, 2_000);
}

#[test]
fn test_tiny_queue_drops_but_balances() {
    let mut config = PipelineConfig::default();
    config.queue.max_queue_depth = 1;
    config.queue.pool_preallocate = 4;
    config.queue.pool_max_size = 4;

    let report = run(&config, &options(4, 1, 5_000)).unwrap();
    assert_eq!(report.produced, 20_000);
    assert!(report.is_balanced());
    assert_eq!(report.queue.dropped, report.dropped);
}

#[test]
fn test_pool_is_reused() {
    let mut config = PipelineConfig::default();
    config.queue.pool_preallocate = 64;
    config.queue.pool_max_size = 256;

    let report = run(&config, &options(1, 1, 5_000)).unwrap();
    assert!(report.pool.hits > 0);
    assert_eq!(report.pool.hits + report.pool.misses, 5_000);
}

#[test]
fn test_pinning_is_best_effort() {
    let mut config = PipelineConfig::default();
    config.affinity.enabled = true;
    config.affinity.cores = vec![0, 4_096];

    let report = run(&config, &options(1, 2, 500)).unwrap();
    assert!(report.is_balanced());
}

#[test]
fn test_zero_workers_rejected() {
    let config = PipelineConfig::default();
    assert!(run(&config, &options(0, 1, 10)).is_err());
    assert!(run(&config, &options(1, 0, 10)).is_err());
}

#[test]
fn test_config_file_drives_run() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[queue]\nmax_queue_depth = 16\n\n[codec]\nverify_checksum = true").unwrap();

    let config = PipelineConfig::load_with_env(Some(file.path()), Some(Default::default())).unwrap();
    assert_eq!(config.queue.max_queue_depth, 16);

    let report = run(&config, &options(2, 1, 1_000)).unwrap();
    assert!(report.is_balanced());
}

#[test]
fn test_sample_order_roundtrips() {
    let order = sample_order(3, 17);
    let decoded = decode(&encode(&order)).unwrap();
    assert_eq!(decoded, order);
    assert_eq!(decoded.field(tags::CL_ORD_ID), Some("3-17"));
    assert_eq!(decoded.sender_comp_id(), "PRODUCER3");
    assert!(decoded.validate().is_ok());
}

#[test]
fn test_latency_merged_across_consumers() {
    let config = PipelineConfig::default();
    let report = run(&config, &options(2, 4, 1_500)).unwrap();

    assert_eq!(report.consumed, 3_000);
    assert_eq!(report.latency.count, 3_000);
    assert!(report.latency.max_ns >= report.latency.p99_ns);
    assert!(report.latency.p99_ns >= report.latency.p50_ns);
}
