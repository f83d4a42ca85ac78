//! # Pipeline Configuration
//!
//! Centralised configuration for the FIX codec and queue pipeline, plus the
//! logging bootstrap every binary calls first.
//!
//! Sources, lowest to highest precedence:
//! 1. Built-in defaults
//! 2. TOML file
//! 3. `FIXQ__SECTION__KEY` environment variables

pub mod logging;
pub mod pipeline_config;

pub use logging::init_logging;
pub use pipeline_config::{
    AffinitySettings, CodecSettings, LoggingSettings, PipelineConfig, QueueSettings,
    DEFAULT_CONFIG_PATH, ENV_PREFIX,
};
