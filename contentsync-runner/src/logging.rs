//! Tracing subscriber setup for the runner binary.

use anyhow::{Context, Result, anyhow};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Filter used when `RUST_LOG` is not set.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}

/// Installs the global subscriber: compact stdout output, optionally teed
/// into an append-only log file.
pub fn init_tracing(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact();

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(std::io::stdout.and(Mutex::new(file)))
                .try_init()
                .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
        }
        None => builder
            .try_init()
            .map_err(|e| anyhow!("failed to install tracing subscriber: {e}")),
    }
}
