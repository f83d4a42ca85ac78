//! Logging bootstrap
//!
//! Installs a `tracing-subscriber` fmt subscriber filtered by `RUST_LOG`
//! when set, otherwise by the configured level. Calling it again after a
//! subscriber is installed keeps the existing one.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::pipeline_config::LoggingSettings;

pub fn init_logging(settings: &LoggingSettings) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&settings.level)
            .with_context(|| format!("Invalid log level directive {:?}", settings.level))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true);

    let installed = if settings.json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    };

    if installed {
        tracing::debug!(level = %settings.level, json = settings.json, "Logging initialised");
    }
    Ok(())
}
