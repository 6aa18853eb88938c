//! Runner for the contentsync engine.
//!
//! Resolves settings, builds the source and destination clients, and hands
//! them to the orchestrator. Only startup problems are returned as errors; a
//! run that reaches the orchestrator always completes with a summary.

pub mod logging;
pub mod settings;

pub use logging::init_tracing;
pub use settings::{Cli, DestinationSettings, RunnerFile, Settings, load_config_file};

use anyhow::{Context, Result};
use contentsync_sync::{
    AuditSink, ContentSource, Destination, NotionSource, PostgrestConfig, PostgrestStore,
    RunSummary, SqliteStore, SyncOrchestrator,
};
use std::sync::Arc;
use tracing::info;

/// Loads configuration for `cli` from the file and process environment, then
/// runs the sync.
pub async fn execute(cli: &Cli) -> Result<RunSummary> {
    let file = match &cli.config {
        Some(path) => load_config_file(path)?,
        None => RunnerFile::default(),
    };
    let settings = Settings::resolve(cli, file, |name| std::env::var(name).ok())?;
    run(settings).await
}

/// Runs every configured table once.
pub async fn run(settings: Settings) -> Result<RunSummary> {
    let source = Arc::new(
        NotionSource::new(settings.notion.clone()).context("failed to create Notion client")?,
    );

    let (destination, audit): (Arc<dyn Destination>, Arc<dyn AuditSink>) =
        match &settings.destination {
            DestinationSettings::Sqlite { path } => {
                let store = Arc::new(
                    SqliteStore::new(path, &settings.sync.audit_table)
                        .with_context(|| format!("failed to open {}", path.display()))?,
                );
                for spec in &settings.tables {
                    store.ensure_table(spec, &settings.sync.synced_at_column)?;
                }
                (
                    store.clone() as Arc<dyn Destination>,
                    store as Arc<dyn AuditSink>,
                )
            }
            DestinationSettings::Postgrest { url, service_key } => {
                let mut config = PostgrestConfig::new(url.as_str(), service_key.as_str());
                config.audit_table = settings.sync.audit_table.clone();
                let store = Arc::new(
                    PostgrestStore::new(config).context("failed to create Supabase client")?,
                );
                (
                    store.clone() as Arc<dyn Destination>,
                    store as Arc<dyn AuditSink>,
                )
            }
        };

    info!(
        "Syncing {} tables from {} into {}{}",
        settings.tables.len(),
        source.provider_name(),
        destination.provider_name(),
        if settings.sync.dry_run { " (dry run)" } else { "" }
    );

    let orchestrator =
        SyncOrchestrator::from_parts(source, destination, audit, settings.refs, settings.sync);
    Ok(orchestrator.run_all(&settings.tables).await)
}
