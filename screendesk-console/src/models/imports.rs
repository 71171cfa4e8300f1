//! Import records (backend `/api/imports/*` contract)

use serde::{Deserialize, Serialize};

/// One previously uploaded sanctions-list file, as reported by the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRecord {
    pub filename: String,
    /// Backend processing status (e.g. "pending", "processed", "failed")
    pub status: String,
    #[serde(rename = "entriesUpdated", default)]
    pub entries_updated: Option<i64>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(rename = "fileSize", default)]
    pub file_size: Option<i64>,
}

/// Backend response to a multipart upload
///
/// Server-side processing is asynchronous; callers poll recent imports to
/// observe progress.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}
