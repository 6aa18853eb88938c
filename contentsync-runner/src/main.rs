//! contentsync runner
//!
//! Syncs every configured Notion database into its destination table once and
//! exits. Meant to be started on a fixed interval (cron, systemd timer).
//!
//! Usage:
//!   contentsync --config contentsync.toml
//!   contentsync --sqlite cache.db --tables content_blog_posts,content_services
//!
//! Exits 0 whenever the run completes, even if tables or records failed; those
//! outcomes are in the audit table. Exits 1 only when startup fails.

use clap::Parser;
use contentsync_runner::{Cli, execute, init_tracing};
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    // .env must be loaded before clap reads env-backed flags.
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose, cli.log_file.as_deref()) {
        eprintln!("{e:#}");
        return ExitCode::FAILURE;
    }
    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    info!("contentsync {} starting...", env!("CARGO_PKG_VERSION"));
    match execute(&cli).await {
        Ok(summary) => {
            info!(
                "Run finished: {} records synced, {} errors",
                summary.total_records_synced(),
                summary.total_errors()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Startup failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}
