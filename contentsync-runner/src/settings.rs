//! Startup configuration: CLI flags, environment, and the optional TOML file.
//!
//! Everything here runs before the first table is attempted. Any error is
//! startup-fatal and ends the process with a non-zero exit code.

use anyhow::{Context, Result, bail, ensure};
use clap::Parser;
use contentsync_sync::{
    NotionConfig, SourceRefs, SyncConfig, TableSyncSpec, builtin_tables, validate_identifier,
};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

pub const NOTION_API_KEY: &str = "NOTION_API_KEY";
pub const NOTION_API_BASE_URL: &str = "NOTION_API_BASE_URL";
pub const SUPABASE_URL: &str = "SUPABASE_URL";
pub const SUPABASE_SERVICE_ROLE_KEY: &str = "SUPABASE_SERVICE_ROLE_KEY";

#[derive(Parser, Debug, Clone, Default, PartialEq)]
#[command(name = "contentsync")]
#[command(about = "Sync Notion content databases into relational tables")]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "CONTENTSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write into a local SQLite database instead of the Supabase REST API
    #[arg(long, value_name = "PATH")]
    pub sqlite: Option<PathBuf>,

    /// Only sync these destination tables (comma-separated)
    #[arg(long, value_delimiter = ',', value_name = "TABLES")]
    pub tables: Vec<String>,

    /// Maximum number of tables synced at the same time
    #[arg(long)]
    pub max_concurrent_tables: Option<usize>,

    /// Fetch and map records without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Also append log output to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// Contents of the TOML configuration file. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerFile {
    pub sync: SyncConfig,
    /// Source database ids by reference name. The environment wins.
    pub sources: HashMap<String, String>,
    /// Replaces the built-in catalog when present.
    pub tables: Option<Vec<TableSyncSpec>>,
}

/// Reads and parses a configuration file.
pub fn load_config_file(path: &Path) -> Result<RunnerFile> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("invalid config file {}", path.display()))
}

/// Where rows and audit entries are written.
#[derive(Debug, Clone, PartialEq)]
pub enum DestinationSettings {
    Postgrest { url: String, service_key: String },
    Sqlite { path: PathBuf },
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub notion: NotionConfig,
    pub destination: DestinationSettings,
    pub sync: SyncConfig,
    pub tables: Vec<TableSyncSpec>,
    pub refs: SourceRefs,
}

impl Settings {
    /// Resolves settings from the CLI, the parsed file, and a variable lookup
    /// (the process environment in production).
    pub fn resolve<F>(cli: &Cli, file: RunnerFile, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let mut missing = Vec::new();
        let api_key = var(NOTION_API_KEY);
        if api_key.is_none() {
            missing.push(NOTION_API_KEY);
        }

        let destination = match &cli.sqlite {
            Some(path) => Some(DestinationSettings::Sqlite { path: path.clone() }),
            None => {
                let url = var(SUPABASE_URL);
                let service_key = var(SUPABASE_SERVICE_ROLE_KEY);
                if url.is_none() {
                    missing.push(SUPABASE_URL);
                }
                if service_key.is_none() {
                    missing.push(SUPABASE_SERVICE_ROLE_KEY);
                }
                url.zip(service_key)
                    .map(|(url, service_key)| DestinationSettings::Postgrest { url, service_key })
            }
        };

        let (Some(api_key), Some(destination)) = (api_key, destination) else {
            bail!("missing required environment variables: {}", missing.join(", "));
        };

        let mut notion = NotionConfig {
            api_key,
            ..Default::default()
        };
        if let Some(base) = var(NOTION_API_BASE_URL) {
            notion.api_base_url = base;
        }

        let mut sync = file.sync;
        if let Some(n) = cli.max_concurrent_tables {
            sync.max_concurrent_tables = n;
        }
        if cli.dry_run {
            sync.dry_run = true;
        }
        validate_sync_config(&sync)?;

        let tables = select_tables(file.tables.unwrap_or_else(builtin_tables), &cli.tables)?;
        let mut seen = HashSet::new();
        for spec in &tables {
            spec.validate(&sync.synced_at_column)
                .with_context(|| format!("invalid table definition {}", spec.table))?;
            ensure!(seen.insert(spec.table.as_str()), "table {} defined twice", spec.table);
        }

        let mut refs = SourceRefs::from_lookup(&tables, &var);
        refs.fill_from(&file.sources);

        Ok(Self {
            notion,
            destination,
            sync,
            tables,
            refs,
        })
    }
}

fn validate_sync_config(sync: &SyncConfig) -> Result<()> {
    ensure!(!sync.sync_type.trim().is_empty(), "sync_type must not be empty");
    validate_identifier(&sync.audit_table).context("invalid audit_table")?;
    validate_identifier(&sync.synced_at_column).context("invalid synced_at_column")?;
    ensure!(sync.fetch_timeout_secs > 0, "fetch_timeout_secs must be positive");
    ensure!(sync.upsert_timeout_secs > 0, "upsert_timeout_secs must be positive");
    ensure!(sync.run_deadline_secs > 0, "run_deadline_secs must be positive");
    ensure!(sync.max_concurrent_tables > 0, "max_concurrent_tables must be positive");
    Ok(())
}

/// Keeps only the named tables, in catalog order. An empty filter keeps all.
fn select_tables(tables: Vec<TableSyncSpec>, filter: &[String]) -> Result<Vec<TableSyncSpec>> {
    let wanted: HashSet<&str> = filter
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if wanted.is_empty() {
        return Ok(tables);
    }

    let known: HashSet<&str> = tables.iter().map(|t| t.table.as_str()).collect();
    let mut unknown: Vec<&str> = wanted.difference(&known).copied().collect();
    if !unknown.is_empty() {
        unknown.sort_unstable();
        bail!("unknown tables: {}", unknown.join(", "));
    }

    Ok(tables
        .into_iter()
        .filter(|t| wanted.contains(t.table.as_str()))
        .collect())
}
