//! Audit log entries (backend `/api/audit-logs` contract)

use serde::{Deserialize, Serialize};

/// One audit log entry recorded by the backend for a user search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(rename = "searchTerm")]
    pub search_term: String,
    #[serde(rename = "searchType", default)]
    pub search_type: Option<String>,
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
    pub timestamp: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub action: Option<String>,
}
