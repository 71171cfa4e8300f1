//! Audit log API handler
//!
//! GET /audit-logs relays the backend's audit trail; a backend failure
//! degrades to the cached copy plus a visible message, never an empty error
//! page.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::db::kv;
use crate::error::ApiResult;
use crate::models::AuditLogEntry;
use crate::AppState;

/// GET /audit-logs response
#[derive(Debug, Serialize)]
pub struct AuditLogsResponse {
    pub entries: Vec<AuditLogEntry>,
    /// True when the backend was unreachable and the cached copy is shown
    pub stale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /audit-logs
pub async fn get_audit_logs(State(state): State<AppState>) -> ApiResult<Json<AuditLogsResponse>> {
    match state.backend.audit_logs().await {
        Ok(entries) => {
            kv::cache_audit_logs(&state.db, &entries).await?;
            Ok(Json(AuditLogsResponse {
                entries,
                stale: false,
                error: None,
            }))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Audit log fetch failed, serving cached copy");
            state.record_error(e.to_string()).await;
            let entries = kv::cached_audit_logs(&state.db).await?;
            Ok(Json(AuditLogsResponse {
                entries,
                stale: true,
                error: Some(e.to_string()),
            }))
        }
    }
}

/// Build audit routes
pub fn audit_routes() -> Router<AppState> {
    Router::new().route("/audit-logs", get(get_audit_logs))
}
