//! FIX pipeline soak binary

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use fix_pipeline::{run, RunOptions};
use pipeline_config::{init_logging, PipelineConfig};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path (defaults to ./fix-pipeline.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Producer threads
    #[arg(short, long, default_value_t = 2)]
    producers: usize,

    /// Consumer threads
    #[arg(short = 'C', long, default_value_t = 2)]
    consumers: usize,

    /// Messages generated by each producer
    #[arg(short = 'n', long, default_value_t = 100_000)]
    messages: u64,

    /// Consumer poll deadline in milliseconds
    #[arg(long, default_value_t = 50)]
    recv_timeout_ms: u64,

    /// Override queue.max_queue_depth
    #[arg(long)]
    max_queue_depth: Option<usize>,

    /// Verify checksums on decode
    #[arg(long)]
    verify_checksum: bool,

    /// Reject duplicate body tags on decode
    #[arg(long)]
    strict_duplicate_tags: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = PipelineConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(depth) = args.max_queue_depth {
        config.queue.max_queue_depth = depth;
    }
    config.codec.verify_checksum |= args.verify_checksum;
    config.codec.strict_duplicate_tags |= args.strict_duplicate_tags;
    config.validate()?;

    if args.print_config {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    init_logging(&config.logging)?;
    info!("Starting FIX pipeline v{}", env!("CARGO_PKG_VERSION"));

    let options = RunOptions {
        producers: args.producers,
        consumers: args.consumers,
        messages_per_producer: args.messages,
        recv_timeout: Duration::from_millis(args.recv_timeout_ms),
    };

    match run(&config, &options) {
        Ok(report) => {
            if !report.is_balanced() {
                error!(
                    produced = report.produced,
                    consumed = report.consumed,
                    dropped = report.dropped,
                    "Message accounting mismatch"
                );
            }
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Pipeline failed");
            Err(e)
        }
    }
}
