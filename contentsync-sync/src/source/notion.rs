//! Notion database source.
//!
//! Uses the database query endpoint (`POST /v1/databases/{id}/query`) and
//! follows `next_cursor` until `has_more` is false.

use super::ContentSource;
use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use contentsync_types::ExternalRecord;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// API version header sent with every request.
pub const NOTION_VERSION: &str = "2022-06-28";

/// Largest page size the query endpoint accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Notion client configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct NotionConfig {
    /// Integration token.
    pub api_key: String,
    /// Base URL for the API (e.g. `https://api.notion.com`).
    pub api_base_url: String,
    /// Value of the `Notion-Version` header.
    pub notion_version: String,
    /// Records requested per page (1–100).
    pub page_size: u32,
    /// Timeout for a single HTTP request (seconds).
    pub request_timeout_secs: u64,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base_url: "https://api.notion.com".to_string(),
            notion_version: NOTION_VERSION.to_string(),
            page_size: MAX_PAGE_SIZE,
            request_timeout_secs: 30,
        }
    }
}

impl fmt::Debug for NotionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotionConfig")
            .field("api_key", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .field("notion_version", &self.notion_version)
            .field("page_size", &self.page_size)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Query endpoint response page. Results stay raw so one bad item only
/// affects itself.
#[derive(Debug, Deserialize)]
struct QueryPage {
    #[serde(default)]
    results: Vec<Value>,
    #[serde(default)]
    has_more: bool,
    next_cursor: Option<String>,
}

/// Error body returned by the API.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_cursor: Option<&'a str>,
}

/// Notion implementation of [`ContentSource`].
pub struct NotionSource {
    config: NotionConfig,
    client: Client,
}

impl NotionSource {
    /// Creates a new Notion source.
    pub fn new(config: NotionConfig) -> SyncResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(SyncError::Config("notion api key is empty".to_string()));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| SyncError::Network(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &NotionConfig {
        &self.config
    }

    fn query_url(&self, database_id: &str) -> String {
        format!(
            "{}/v1/databases/{}/query",
            self.config.api_base_url.trim_end_matches('/'),
            urlencoding::encode(database_id)
        )
    }

    async fn query_page(&self, database_id: &str, cursor: Option<&str>) -> SyncResult<QueryPage> {
        let body = QueryRequest {
            page_size: self.config.page_size.clamp(1, MAX_PAGE_SIZE),
            start_cursor: cursor,
        };

        let response = self
            .client
            .post(self.query_url(database_id))
            .bearer_auth(&self.config.api_key)
            .header("Notion-Version", &self.config.notion_version)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SyncError::Timeout(format!("query of database {database_id}"))
                } else {
                    SyncError::Network(format!("database query failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorBody>(&text) {
                Ok(ApiErrorBody {
                    code: Some(code),
                    message: Some(message),
                }) => format!("{code}: {message}"),
                Ok(ApiErrorBody {
                    message: Some(message),
                    ..
                }) => message,
                _ => text,
            };
            return Err(SyncError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| SyncError::Network(format!("failed to read query response: {e}")))?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl ContentSource for NotionSource {
    fn provider_name(&self) -> &'static str {
        "Notion"
    }

    async fn fetch_all(&self, database_id: &str) -> SyncResult<Vec<ExternalRecord>> {
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self.query_page(database_id, cursor.as_deref()).await?;
            pages += 1;
            for item in page.results {
                let record = ExternalRecord::from_json_lossy(item);
                if let Some(reason) = record.malformed_reason() {
                    warn!(
                        "Unparseable result {:?} in database {}: {}",
                        record.id.as_str(),
                        database_id,
                        reason
                    );
                }
                records.push(record);
            }

            if !page.has_more {
                break;
            }
            // A partial result set is never returned as a complete one.
            match page.next_cursor {
                Some(next) if Some(next.as_str()) != cursor.as_deref() => cursor = Some(next),
                Some(_) => {
                    return Err(SyncError::Protocol(format!(
                        "database {database_id} repeated its cursor after {pages} pages"
                    )));
                }
                None => {
                    return Err(SyncError::Protocol(format!(
                        "database {database_id} reported more results without a cursor after {pages} pages"
                    )));
                }
            }
        }

        debug!(
            "Fetched {} records from database {} in {} pages",
            records.len(),
            database_id,
            pages
        );
        Ok(records)
    }
}
