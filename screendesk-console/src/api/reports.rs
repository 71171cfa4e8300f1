//! Report summary API handler
//!
//! GET /reports/summary computes dashboard numbers from the store. The
//! match rate is the percentage of recorded searches whose top similarity
//! met the flag threshold.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::db::{flags, history};
use crate::error::ApiResult;
use crate::AppState;

/// GET /reports/summary response
#[derive(Debug, Serialize)]
pub struct ReportSummaryResponse {
    pub total_searches: i64,
    pub flagged_count: i64,
    pub cleared_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_duration_ms: Option<f64>,
    /// Percentage of searches whose top similarity met the flag threshold
    pub match_rate: f64,
    pub flag_threshold: f64,
}

/// GET /reports/summary
pub async fn report_summary(State(state): State<AppState>) -> ApiResult<Json<ReportSummaryResponse>> {
    let threshold = state.config.flag_threshold;
    let stats = history::search_stats(&state.db, threshold).await?;
    let flagged_count = flags::flagged_count(&state.db).await?;
    let cleared_count = flags::cleared_count(&state.db).await?;

    Ok(Json(ReportSummaryResponse {
        total_searches: stats.total_searches,
        flagged_count,
        cleared_count,
        average_duration_ms: stats.average_duration_ms,
        match_rate: stats.match_rate,
        flag_threshold: threshold,
    }))
}

/// Build report routes
pub fn report_routes() -> Router<AppState> {
    Router::new().route("/reports/summary", get(report_summary))
}
