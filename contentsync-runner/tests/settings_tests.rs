use clap::Parser;
use contentsync_runner::logging::default_directive;
use contentsync_runner::{Cli, DestinationSettings, RunnerFile, Settings, load_config_file};
use contentsync_types::{FieldKind, NormalizedValue};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;

fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

fn full_env() -> impl Fn(&str) -> Option<String> {
    env(&[
        ("NOTION_API_KEY", "secret_notion"),
        ("SUPABASE_URL", "https://proj.supabase.co"),
        ("SUPABASE_SERVICE_ROLE_KEY", "service"),
        ("NOTION_BLOG_POSTS_DB_ID", "db-blog"),
    ])
}

fn write_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

// ── CLI ─────────────────────────────────────────────────────────

#[test]
fn cli_parses_all_flags() {
    let cli = Cli::try_parse_from([
        "contentsync",
        "--config",
        "sync.toml",
        "--sqlite",
        "cache.db",
        "--tables",
        "content_blog_posts,content_services",
        "--max-concurrent-tables",
        "3",
        "--dry-run",
        "--verbose",
        "--log-file",
        "sync.log",
    ])
    .unwrap();

    assert_eq!(cli.config, Some(PathBuf::from("sync.toml")));
    assert_eq!(cli.sqlite, Some(PathBuf::from("cache.db")));
    assert_eq!(cli.tables, vec!["content_blog_posts", "content_services"]);
    assert_eq!(cli.max_concurrent_tables, Some(3));
    assert!(cli.dry_run);
    assert!(cli.verbose);
    assert_eq!(cli.log_file, Some(PathBuf::from("sync.log")));
}

#[test]
fn cli_defaults() {
    let cli = Cli::try_parse_from(["contentsync"]).unwrap();
    assert!(cli.sqlite.is_none());
    assert!(cli.tables.is_empty());
    assert!(!cli.dry_run);
}

#[test]
fn log_directive_follows_verbosity() {
    assert_eq!(default_directive(false), "info");
    assert_eq!(default_directive(true), "debug");
}

// ── Required variables ──────────────────────────────────────────

#[test]
fn resolves_postgrest_destination() {
    let settings = Settings::resolve(&Cli::default(), RunnerFile::default(), full_env()).unwrap();

    assert_eq!(settings.notion.api_key, "secret_notion");
    assert_eq!(settings.notion.api_base_url, "https://api.notion.com");
    assert_eq!(
        settings.destination,
        DestinationSettings::Postgrest {
            url: "https://proj.supabase.co".to_string(),
            service_key: "service".to_string(),
        }
    );
    assert_eq!(settings.tables.len(), 7);
    assert_eq!(settings.refs.resolve("NOTION_BLOG_POSTS_DB_ID"), Some("db-blog"));
    assert_eq!(settings.refs.resolve("NOTION_SERVICES_DB_ID"), None);
}

#[test]
fn missing_variables_are_listed() {
    let err = Settings::resolve(&Cli::default(), RunnerFile::default(), env(&[]))
        .unwrap_err()
        .to_string();
    assert!(err.contains("NOTION_API_KEY"), "{err}");
    assert!(err.contains("SUPABASE_URL"), "{err}");
    assert!(err.contains("SUPABASE_SERVICE_ROLE_KEY"), "{err}");
}

#[test]
fn blank_variable_counts_as_missing() {
    let lookup = env(&[
        ("NOTION_API_KEY", "  "),
        ("SUPABASE_URL", "https://proj.supabase.co"),
        ("SUPABASE_SERVICE_ROLE_KEY", "service"),
    ]);
    let err = Settings::resolve(&Cli::default(), RunnerFile::default(), lookup).unwrap_err();
    assert!(err.to_string().contains("NOTION_API_KEY"));
}

#[test]
fn sqlite_does_not_need_supabase() {
    let cli = Cli {
        sqlite: Some(PathBuf::from("cache.db")),
        ..Default::default()
    };
    let settings =
        Settings::resolve(&cli, RunnerFile::default(), env(&[("NOTION_API_KEY", "k")])).unwrap();
    assert_eq!(
        settings.destination,
        DestinationSettings::Sqlite {
            path: PathBuf::from("cache.db")
        }
    );
}

#[test]
fn notion_base_url_override() {
    let cli = Cli {
        sqlite: Some(PathBuf::from("cache.db")),
        ..Default::default()
    };
    let lookup = env(&[
        ("NOTION_API_KEY", "k"),
        ("NOTION_API_BASE_URL", "http://localhost:9999"),
    ]);
    let settings = Settings::resolve(&cli, RunnerFile::default(), lookup).unwrap();
    assert_eq!(settings.notion.api_base_url, "http://localhost:9999");
}

// ── CLI overrides ───────────────────────────────────────────────

#[test]
fn cli_overrides_sync_options() {
    let cli = Cli {
        max_concurrent_tables: Some(4),
        dry_run: true,
        ..Default::default()
    };
    let settings = Settings::resolve(&cli, RunnerFile::default(), full_env()).unwrap();
    assert_eq!(settings.sync.max_concurrent_tables, 4);
    assert!(settings.sync.dry_run);
}

#[test]
fn zero_concurrency_rejected() {
    let cli = Cli {
        max_concurrent_tables: Some(0),
        ..Default::default()
    };
    assert!(Settings::resolve(&cli, RunnerFile::default(), full_env()).is_err());
}

#[test]
fn table_filter_keeps_catalog_order() {
    let cli = Cli {
        tables: vec!["knowledge_files".to_string(), "content_blog_posts".to_string()],
        ..Default::default()
    };
    let settings = Settings::resolve(&cli, RunnerFile::default(), full_env()).unwrap();
    let names: Vec<&str> = settings.tables.iter().map(|t| t.table.as_str()).collect();
    assert_eq!(names, vec!["content_blog_posts", "knowledge_files"]);
}

#[test]
fn unknown_table_in_filter_rejected() {
    let cli = Cli {
        tables: vec!["content_blog_posts".to_string(), "nope".to_string()],
        ..Default::default()
    };
    let err = Settings::resolve(&cli, RunnerFile::default(), full_env()).unwrap_err();
    assert!(err.to_string().contains("unknown tables: nope"));
}

// ── Config file ─────────────────────────────────────────────────

#[test]
fn config_file_sections() {
    let file = write_file(
        r#"
[sync]
fetch_timeout_secs = 120
max_concurrent_tables = 2
audit_table = "sync_log"

[sources]
NOTION_BLOG_POSTS_DB_ID = "from-file"
NOTION_SERVICES_DB_ID = "db-services"
"#,
    );
    let parsed = load_config_file(file.path()).unwrap();
    assert_eq!(parsed.sync.fetch_timeout_secs, 120);
    assert_eq!(parsed.sync.upsert_timeout_secs, 30);
    assert_eq!(parsed.sync.audit_table, "sync_log");
    assert!(parsed.tables.is_none());

    let settings = Settings::resolve(&Cli::default(), parsed, full_env()).unwrap();
    // Environment wins over the file.
    assert_eq!(settings.refs.resolve("NOTION_BLOG_POSTS_DB_ID"), Some("db-blog"));
    assert_eq!(settings.refs.resolve("NOTION_SERVICES_DB_ID"), Some("db-services"));
    assert_eq!(settings.sync.max_concurrent_tables, 2);
}

#[test]
fn config_file_tables_replace_catalog() {
    let file = write_file(
        r#"
[[tables]]
table = "content_faqs"
source_ref = "FAQ_DB_ID"
record_label = "FAQ"

[[tables.columns]]
column = "question"
field = "Question"
kind = "title"

[[tables.columns]]
column = "order"
field = "Order"
kind = "number"
fallback = 0

[sources]
FAQ_DB_ID = "db-faq"
"#,
    );
    let parsed = load_config_file(file.path()).unwrap();
    let settings = Settings::resolve(&Cli::default(), parsed, full_env()).unwrap();

    assert_eq!(settings.tables.len(), 1);
    let spec = &settings.tables[0];
    assert_eq!(spec.table, "content_faqs");
    assert_eq!(spec.conflict_key, "notion_id");
    assert_eq!(spec.record_label, "FAQ");
    assert_eq!(spec.columns[0].kind, FieldKind::Title);
    assert_eq!(spec.columns[1].fallback, Some(NormalizedValue::from(0i64)));
    assert_eq!(settings.refs.resolve("FAQ_DB_ID"), Some("db-faq"));
}

#[test]
fn invalid_table_in_file_rejected() {
    let file = write_file(
        r#"
[[tables]]
table = "content_faqs"
source_ref = "FAQ_DB_ID"

[[tables.columns]]
column = "notion_id"
field = "Id"
kind = "text"
"#,
    );
    let parsed = load_config_file(file.path()).unwrap();
    let err = Settings::resolve(&Cli::default(), parsed, full_env()).unwrap_err();
    assert!(format!("{err:#}").contains("content_faqs"));
}

#[test]
fn duplicate_tables_rejected() {
    let table = r#"
[[tables]]
table = "content_faqs"
source_ref = "FAQ_DB_ID"

[[tables.columns]]
column = "question"
field = "Question"
kind = "title"
"#;
    let file = write_file(&format!("{table}{table}"));
    let parsed = load_config_file(file.path()).unwrap();
    let err = Settings::resolve(&Cli::default(), parsed, full_env()).unwrap_err();
    assert!(err.to_string().contains("defined twice"));
}

#[test]
fn unknown_keys_rejected() {
    let file = write_file("[sink]\nurl = \"x\"\n");
    assert!(load_config_file(file.path()).is_err());
}

#[test]
fn missing_file_is_an_error() {
    let err = load_config_file(std::path::Path::new("/nonexistent/contentsync.toml")).unwrap_err();
    assert!(err.to_string().contains("failed to read config file"));
}
