//! Flag review API handlers
//!
//! GET /flags, POST /flags/{key}/clear, GET /flags/history

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use screendesk_common::events::ConsoleEvent;

use crate::db::flags;
use crate::error::{ApiError, ApiResult};
use crate::models::{ClearRecord, FlaggedResult};
use crate::AppState;

/// GET /flags response
#[derive(Debug, Serialize)]
pub struct FlaggedListResponse {
    pub flagged: Vec<FlaggedResult>,
}

/// POST /flags/{key}/clear request
#[derive(Debug, Deserialize)]
pub struct ClearRequest {
    pub reason: String,
}

/// GET /flags/history response
#[derive(Debug, Serialize)]
pub struct ClearHistoryResponse {
    pub history: Vec<ClearRecord>,
}

/// GET /flags
pub async fn list_flags(State(state): State<AppState>) -> ApiResult<Json<FlaggedListResponse>> {
    let flagged = flags::list_flagged(&state.db).await?;
    Ok(Json(FlaggedListResponse { flagged }))
}

/// POST /flags/{key}/clear
///
/// The reason is validated locally; no collaborator is contacted for this
/// operation. Clearing is terminal.
pub async fn clear_flag(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(request): Json<ClearRequest>,
) -> ApiResult<Json<ClearRecord>> {
    if request.reason.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "A reason is required to clear a flagged result".to_string(),
        ));
    }

    let record = flags::clear_flag(&state.db, &key, &request.reason).await?;

    state.event_bus.emit_lossy(ConsoleEvent::FlagCleared {
        key: key.clone(),
        timestamp: Utc::now(),
    });
    tracing::info!(key = %key, "Flagged result cleared");

    Ok(Json(record))
}

/// GET /flags/history
pub async fn get_clear_history(
    State(state): State<AppState>,
) -> ApiResult<Json<ClearHistoryResponse>> {
    let history = flags::clear_history(&state.db).await?;
    Ok(Json(ClearHistoryResponse { history }))
}

/// Build flag review routes
pub fn flag_routes() -> Router<AppState> {
    Router::new()
        .route("/flags", get(list_flags))
        .route("/flags/:key/clear", post(clear_flag))
        .route("/flags/history", get(get_clear_history))
}
