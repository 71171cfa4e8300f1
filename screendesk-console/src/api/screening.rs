//! Batch screening API handlers
//!
//! POST /screening/start, GET /screening/status/{id},
//! GET /screening/results/{id}, POST /screening/cancel/{id}

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use screendesk_common::events::{ConsoleEvent, EventBus};

use crate::error::{ApiError, ApiResult};
use crate::models::{BatchResult, ScreeningProgress, ScreeningSession, ScreeningState};
use crate::services::batch_screener::{BatchScreener, ProgressSink, RowUpdate};
use crate::services::csv_reader;
use crate::AppState;

/// Extensions accepted for tabular uploads
const TABULAR_EXTENSIONS: &[&str] = &["csv", "txt"];

/// Session-level error when the deadline expired with nothing screened
const DEADLINE_FAILURE: &str = "batch deadline exceeded before any row was screened";

/// POST /screening/start response
#[derive(Debug, Serialize)]
pub struct StartScreeningResponse {
    pub session_id: Uuid,
    pub state: ScreeningState,
    pub total_rows: usize,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

/// GET /screening/status response
#[derive(Debug, Serialize)]
pub struct ScreeningStatusResponse {
    pub session_id: Uuid,
    pub state: ScreeningState,
    pub filename: String,
    pub progress: ScreeningProgress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: chrono::DateTime<chrono::Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// GET /screening/results response
#[derive(Debug, Serialize)]
pub struct ScreeningResultsResponse {
    pub session_id: Uuid,
    pub state: ScreeningState,
    pub results: Vec<BatchResult>,
}

/// POST /screening/cancel response
#[derive(Debug, Serialize)]
pub struct CancelScreeningResponse {
    pub session_id: Uuid,
    pub state: ScreeningState,
    pub rows_processed: usize,
}

/// Reject non-tabular uploads before anything touches the network
///
/// Extension must be CSV-like and the content must not sniff as a known
/// binary format.
pub(crate) fn validate_tabular_file(filename: &str, bytes: &[u8]) -> Result<(), ApiError> {
    let extension = std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if !TABULAR_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ApiError::BadRequest(format!(
            "Unsupported file type \".{}\" for {}: expected a CSV file",
            extension, filename
        )));
    }

    if let Some(kind) = infer::get(bytes) {
        return Err(ApiError::BadRequest(format!(
            "Unsupported file type {} for {}: expected a CSV file",
            kind.mime_type(),
            filename
        )));
    }

    if bytes.is_empty() {
        return Err(ApiError::BadRequest(format!("{} is empty", filename)));
    }

    Ok(())
}

/// Progress adapter: forwards pipeline updates onto the session map and the
/// event bus
struct SessionProgressSink {
    session_id: Uuid,
    sessions: Arc<RwLock<std::collections::HashMap<Uuid, ScreeningSession>>>,
    bus: EventBus,
}

impl ProgressSink for SessionProgressSink {
    fn row_screened(&self, update: RowUpdate) -> impl Future<Output = ()> + Send {
        let sessions = Arc::clone(&self.sessions);
        let bus = self.bus.clone();
        let session_id = self.session_id;
        async move {
            {
                let mut sessions = sessions.write().await;
                if let Some(session) = sessions.get_mut(&session_id) {
                    session.progress.advance();
                }
            }
            bus.emit_lossy(ConsoleEvent::RowScreened {
                session_id,
                row_index: update.row_index,
                total_rows: update.total_rows,
                name: update.name,
                match_count: update.match_count,
                errored: update.errored,
                timestamp: Utc::now(),
            });
        }
    }
}

/// POST /screening/start
///
/// Accepts one CSV file as multipart form data, validates it locally, and
/// spawns the screening pipeline in the background. Responds 202 with the
/// session id for status polling and SSE correlation.
pub async fn start_screening(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<StartScreeningResponse>)> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        if upload.is_some() {
            return Err(ApiError::BadRequest(
                "Batch screening accepts exactly one CSV file".to_string(),
            ));
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Unreadable upload: {}", e)))?;
        upload = Some((filename, bytes.to_vec()));
    }

    let Some((filename, bytes)) = upload else {
        return Err(ApiError::BadRequest("No file uploaded".to_string()));
    };

    validate_tabular_file(&filename, &bytes)?;

    let rows = csv_reader::parse_rows(&bytes)?;
    if rows.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "{} contains no data rows",
            filename
        )));
    }

    let mut session = ScreeningSession::new(filename, rows.len());
    session.transition_to(ScreeningState::Matching);
    let session_id = session.session_id;
    let started_at = session.started_at;
    let total_rows = rows.len();

    let cancel = CancellationToken::new();
    {
        state.sessions.write().await.insert(session_id, session);
        state
            .cancellation_tokens
            .write()
            .await
            .insert(session_id, cancel.clone());
    }

    state.event_bus.emit_lossy(ConsoleEvent::ScreeningStarted {
        session_id,
        total_rows,
        timestamp: Utc::now(),
    });

    tracing::info!(
        session_id = %session_id,
        total_rows,
        "Screening session started"
    );

    // Run the pipeline in the background; results land on the session map.
    let task_state = state.clone();
    tokio::spawn(async move {
        run_screening(task_state, session_id, rows, cancel).await;
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(StartScreeningResponse {
            session_id,
            state: ScreeningState::Matching,
            total_rows,
            started_at,
        }),
    ))
}

/// Background pipeline execution for one session
async fn run_screening(
    state: AppState,
    session_id: Uuid,
    rows: Vec<crate::models::RowRecord>,
    cancel: CancellationToken,
) {
    let started = std::time::Instant::now();
    let config = &state.config;

    let screener = BatchScreener::new(
        Arc::clone(&state.index),
        config.screening_concurrency,
        Duration::from_secs(config.row_timeout_secs),
        Duration::from_secs(config.batch_deadline_secs),
    );
    let sink = SessionProgressSink {
        session_id,
        sessions: Arc::clone(&state.sessions),
        bus: state.event_bus.clone(),
    };

    let results = screener.screen(rows, &cancel, &sink).await;

    let rows_errored = results.iter().filter(|r| r.errored()).count();
    let rows_matched = results.len() - rows_errored;
    let cancelled = cancel.is_cancelled();
    // Deadline exhaustion before a single row was screened is a session
    // failure, not a completed batch of error markers.
    let deadline_exhausted = results
        .iter()
        .any(|r| r.error.as_deref() == Some(crate::services::batch_screener::ERR_DEADLINE));
    let failed = !cancelled && rows_matched == 0 && deadline_exhausted;

    {
        let mut sessions = state.sessions.write().await;
        if let Some(session) = sessions.get_mut(&session_id) {
            session.results = results;
            if cancelled {
                session.transition_to(ScreeningState::Cancelled);
            } else if failed {
                session.error = Some(DEADLINE_FAILURE.to_string());
                session.transition_to(ScreeningState::Failed);
            } else {
                session.transition_to(ScreeningState::Completed);
            }
        }
    }
    state.cancellation_tokens.write().await.remove(&session_id);

    let elapsed_ms = started.elapsed().as_millis() as u64;
    if cancelled {
        tracing::info!(session_id = %session_id, "Screening session cancelled");
        state.event_bus.emit_lossy(ConsoleEvent::ScreeningCancelled {
            session_id,
            rows_processed: rows_matched + rows_errored,
            timestamp: Utc::now(),
        });
    } else if failed {
        tracing::warn!(session_id = %session_id, elapsed_ms, "Screening session failed");
        state.event_bus.emit_lossy(ConsoleEvent::ScreeningFailed {
            session_id,
            error: DEADLINE_FAILURE.to_string(),
            timestamp: Utc::now(),
        });
    } else {
        tracing::info!(
            session_id = %session_id,
            rows_matched,
            rows_errored,
            elapsed_ms,
            "Screening session completed"
        );
        state.event_bus.emit_lossy(ConsoleEvent::ScreeningCompleted {
            session_id,
            rows_matched,
            rows_errored,
            elapsed_ms,
            timestamp: Utc::now(),
        });
    }
}

/// GET /screening/status/{session_id}
pub async fn get_screening_status(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<ScreeningStatusResponse>> {
    let sessions = state.sessions.read().await;
    let session = sessions
        .get(&session_id)
        .ok_or_else(|| ApiError::NotFound(format!("Screening session not found: {}", session_id)))?;

    Ok(Json(ScreeningStatusResponse {
        session_id: session.session_id,
        state: session.state,
        filename: session.filename.clone(),
        progress: session.progress.clone(),
        error: session.error.clone(),
        started_at: session.started_at,
        ended_at: session.ended_at,
    }))
}

/// GET /screening/results/{session_id}
///
/// Returns the aggregated match report. Before the session reaches a
/// terminal state the result list is empty; callers watch status or SSE.
pub async fn get_screening_results(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<ScreeningResultsResponse>> {
    let sessions = state.sessions.read().await;
    let session = sessions
        .get(&session_id)
        .ok_or_else(|| ApiError::NotFound(format!("Screening session not found: {}", session_id)))?;

    Ok(Json(ScreeningResultsResponse {
        session_id: session.session_id,
        state: session.state,
        results: session.results.clone(),
    }))
}

/// POST /screening/cancel/{session_id}
pub async fn cancel_screening(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<CancelScreeningResponse>> {
    let token = state
        .cancellation_tokens
        .read()
        .await
        .get(&session_id)
        .cloned();

    let Some(token) = token else {
        // No token: either unknown session or already finished
        let sessions = state.sessions.read().await;
        let session = sessions.get(&session_id).ok_or_else(|| {
            ApiError::NotFound(format!("Screening session not found: {}", session_id))
        })?;
        return Err(ApiError::Conflict(format!(
            "Screening session already {:?}",
            session.state
        )));
    };

    token.cancel();
    tracing::info!(session_id = %session_id, "Screening cancellation requested");

    let sessions = state.sessions.read().await;
    let session = sessions
        .get(&session_id)
        .ok_or_else(|| ApiError::NotFound(format!("Screening session not found: {}", session_id)))?;

    Ok(Json(CancelScreeningResponse {
        session_id,
        state: session.state,
        rows_processed: session.progress.current,
    }))
}

/// Build screening routes
pub fn screening_routes() -> Router<AppState> {
    Router::new()
        .route("/screening/start", post(start_screening))
        .route("/screening/status/:session_id", get(get_screening_status))
        .route("/screening/results/:session_id", get(get_screening_results))
        .route("/screening/cancel/:session_id", post(cancel_screening))
}
