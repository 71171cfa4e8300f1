//! Compliance backend client
//!
//! HTTP client for the external backend owning authentication, import
//! storage, ad-hoc search and audit logging. The console never reimplements
//! these; it relays requests and decodes responses.

use serde_json::json;
use std::time::Duration;
use thiserror::Error;

use crate::models::{AuditLogEntry, ImportRecord, SearchHit, UploadResponse};

const USER_AGENT: &str = concat!("ScreenDesk/", env!("CARGO_PKG_VERSION"));

/// Backend client errors, one variant per failure class
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Backend error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// One file queued for multipart upload
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// HTTP client for the compliance backend
pub struct BackendClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// GET /api/imports/recent
    pub async fn recent_imports(&self) -> Result<Vec<ImportRecord>, BackendError> {
        let url = format!("{}/api/imports/recent", self.base_url);
        let response = self.http_client.get(&url).send().await.map_err(map_send_error)?;
        decode(response).await
    }

    /// POST /api/imports/upload (multipart, field `files`)
    ///
    /// Server-side processing is asynchronous; callers observe progress by
    /// re-fetching recent imports.
    pub async fn upload_files(&self, files: Vec<UploadFile>) -> Result<UploadResponse, BackendError> {
        let url = format!("{}/api/imports/upload", self.base_url);

        let mut form = reqwest::multipart::Form::new();
        for file in files {
            let part = reqwest::multipart::Part::bytes(file.bytes)
                .file_name(file.filename)
                .mime_str("text/csv")
                .map_err(|e| BackendError::Network(e.to_string()))?;
            form = form.part("files", part);
        }

        let response = self
            .http_client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(map_send_error)?;
        decode(response).await
    }

    /// POST /api/search/search
    pub async fn search(
        &self,
        search_term: &str,
        search_type: &str,
    ) -> Result<Vec<SearchHit>, BackendError> {
        let url = format!("{}/api/search/search", self.base_url);
        let body = json!({
            "searchTerm": search_term,
            "searchType": search_type,
        });

        tracing::debug!(term = %search_term, search_type = %search_type, "Ad-hoc search");

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(map_send_error)?;
        decode(response).await
    }

    /// GET /api/audit-logs
    pub async fn audit_logs(&self) -> Result<Vec<AuditLogEntry>, BackendError> {
        let url = format!("{}/api/audit-logs", self.base_url);
        let response = self.http_client.get(&url).send().await.map_err(map_send_error)?;
        decode(response).await
    }
}

fn map_send_error(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::Timeout
    } else {
        BackendError::Network(e.to_string())
    }
}

async fn decode<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, BackendError> {
    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(BackendError::Api(status.as_u16(), error_text));
    }
    response
        .json()
        .await
        .map_err(|e| BackendError::Parse(e.to_string()))
}
