//! PostgREST destination (Supabase REST API).
//!
//! Rows are upserted with `POST /rest/v1/{table}?on_conflict={key}` and the
//! `resolution=merge-duplicates` preference. PostgREST does not say whether a
//! merge inserted or replaced, so every successful upsert reports
//! [`UpsertOutcome::Merged`].

use super::{Destination, UpsertOutcome};
use crate::audit::AuditSink;
use crate::config::DEFAULT_AUDIT_TABLE;
use crate::error::{SyncError, SyncResult};
use crate::spec::validate_identifier;
use crate::stats::AuditEntry;
use async_trait::async_trait;
use contentsync_types::DestinationRow;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

const UPSERT_PREFER: &str = "resolution=merge-duplicates,return=minimal";
const INSERT_PREFER: &str = "return=minimal";

/// PostgREST client configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct PostgrestConfig {
    /// Project URL (e.g. `https://xyz.supabase.co`).
    pub url: String,
    /// Service-role key, sent as both `apikey` and bearer token.
    pub service_key: String,
    /// Table that receives audit entries.
    pub audit_table: String,
    /// Timeout for a single HTTP request (seconds).
    pub request_timeout_secs: u64,
}

impl PostgrestConfig {
    pub fn new(url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            service_key: service_key.into(),
            audit_table: DEFAULT_AUDIT_TABLE.to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl fmt::Debug for PostgrestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgrestConfig")
            .field("url", &self.url)
            .field("service_key", &"<redacted>")
            .field("audit_table", &self.audit_table)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// PostgREST error body.
#[derive(Debug, Deserialize)]
struct PostgrestError {
    code: Option<String>,
    message: Option<String>,
}

/// PostgREST implementation of [`Destination`] and [`AuditSink`].
pub struct PostgrestStore {
    config: PostgrestConfig,
    client: Client,
}

impl PostgrestStore {
    pub fn new(config: PostgrestConfig) -> SyncResult<Self> {
        if config.url.trim().is_empty() {
            return Err(SyncError::Config("postgrest url is empty".to_string()));
        }
        if config.service_key.trim().is_empty() {
            return Err(SyncError::Config("postgrest service key is empty".to_string()));
        }
        validate_identifier(&config.audit_table)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| SyncError::Network(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &PostgrestConfig {
        &self.config
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.config.url.trim_end_matches('/'), table)
    }

    fn authorized(&self, request: RequestBuilder, prefer: &str) -> RequestBuilder {
        request
            .header("apikey", &self.config.service_key)
            .bearer_auth(&self.config.service_key)
            .header("Prefer", prefer)
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> SyncResult<Response> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                SyncError::Timeout(what.to_string())
            } else {
                SyncError::Network(format!("{what} failed: {e}"))
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<PostgrestError>(&text) {
            Ok(PostgrestError {
                code: Some(code),
                message: Some(message),
            }) => format!("{code}: {message}"),
            Ok(PostgrestError {
                message: Some(message),
                ..
            }) => message,
            _ => text,
        };
        Err(SyncError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl Destination for PostgrestStore {
    fn provider_name(&self) -> &'static str {
        "PostgREST"
    }

    async fn upsert(
        &self,
        table: &str,
        row: &DestinationRow,
        conflict_key: &str,
    ) -> SyncResult<UpsertOutcome> {
        validate_identifier(table)?;
        validate_identifier(conflict_key)?;

        let request = self
            .client
            .post(self.table_url(table))
            .query(&[("on_conflict", conflict_key)])
            .json(&row.to_json());
        self.send(
            self.authorized(request, UPSERT_PREFER),
            &format!("upsert into {table}"),
        )
        .await?;
        Ok(UpsertOutcome::Merged)
    }
}

#[async_trait]
impl AuditSink for PostgrestStore {
    async fn write_entry(&self, entry: &AuditEntry) -> SyncResult<()> {
        let request = self
            .client
            .post(self.table_url(&self.config.audit_table))
            .json(entry);
        self.send(
            self.authorized(request, INSERT_PREFER),
            &format!("insert into {}", self.config.audit_table),
        )
        .await?;
        Ok(())
    }
}
