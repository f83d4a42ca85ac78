//! Pipeline Configuration Module
//!
//! Loads [`PipelineConfig`] from an optional TOML file with environment
//! variable overrides. Every section is `#[serde(default)]`, so a file only
//! needs the keys it changes.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Environment variable prefix; sections and keys are joined with `__`
pub const ENV_PREFIX: &str = "FIXQ";

/// File looked up when no path is given; absence is not an error
pub const DEFAULT_CONFIG_PATH: &str = "fix-pipeline.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub codec: CodecSettings,
    pub queue: QueueSettings,
    pub affinity: AffinitySettings,
    pub logging: LoggingSettings,
}

/// Decoder strictness
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecSettings {
    /// Recompute and compare the 10= checksum on decode
    pub verify_checksum: bool,
    /// Reject messages repeating a body tag instead of keeping the last value
    pub strict_duplicate_tags: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueSettings {
    /// High-water mark above which enqueues are rejected
    pub max_queue_depth: usize,
    /// Wrappers allocated up front
    pub pool_preallocate: usize,
    /// Free-list ceiling; extra wrappers are dropped on release
    pub pool_max_size: usize,
    /// Initial byte capacity of each wrapper
    pub wrapper_capacity: usize,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            max_queue_depth: 65_536,
            pool_preallocate: 1_024,
            pool_max_size: 8_192,
            wrapper_capacity: 512,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AffinitySettings {
    pub enabled: bool,
    /// Cores handed out round-robin to pinned workers
    pub cores: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence when set
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl PipelineConfig {
    /// Load from `path` (required) or [`DEFAULT_CONFIG_PATH`] (optional),
    /// then apply `FIXQ__*` environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// As [`load`](Self::load), reading overrides from `env` instead of the
    /// process environment when given
    pub fn load_with_env(path: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<Self> {
        let file = match path {
            Some(path) => {
                info!("Loading pipeline config: {:?}", path);
                File::from(path).format(FileFormat::Toml).required(true)
            }
            None => {
                debug!("No config path given, trying {}", DEFAULT_CONFIG_PATH);
                File::new(DEFAULT_CONFIG_PATH, FileFormat::Toml).required(false)
            }
        };

        let environment = Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("affinity.cores")
            .try_parsing(true)
            .source(env);

        let config: Self = Config::builder()
            .add_source(file)
            .add_source(environment)
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document without consulting files or the environment
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source).context("Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    pub fn validate(&self) -> Result<()> {
        let queue = &self.queue;
        ensure!(queue.max_queue_depth > 0, "queue.max_queue_depth must be greater than zero");
        ensure!(
            queue.pool_max_size >= queue.pool_preallocate,
            "queue.pool_max_size ({}) must be at least queue.pool_preallocate ({})",
            queue.pool_max_size,
            queue.pool_preallocate
        );
        ensure!(queue.wrapper_capacity > 0, "queue.wrapper_capacity must be greater than zero");
        ensure!(
            !(self.affinity.enabled && self.affinity.cores.is_empty()),
            "affinity.enabled requires at least one entry in affinity.cores"
        );
        Ok(())
    }
}
