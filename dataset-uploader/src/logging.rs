//! Logging setup for the CLI.
//!
//! Lifecycle events go to a local log file that is truncated at start-up.
//! Nothing is logged to the console: the pipeline's own echo lines and the
//! progress bar are the only terminal output.

use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "dataset_uploader=info,dataset_uploader_core=info";

/// Initialise tracing with a file writer. `RUST_LOG` overrides the filter.
pub fn init_logging(log_file: &Path) -> Result<()> {
    let file = File::create(log_file)
        .with_context(|| format!("Failed to create log file: {}", log_file.display()))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_filter(filter),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}
