//! Ad-hoc search API handler
//!
//! POST /search delegates to the compliance backend, auto-flags results
//! crossing the review threshold, and records the search in history.

use axum::{extract::State, routing::post, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use screendesk_common::events::ConsoleEvent;

use crate::db::{flags, history};
use crate::error::{ApiError, ApiResult};
use crate::models::SearchHit;
use crate::AppState;

/// POST /search request
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(alias = "searchTerm")]
    pub search_term: String,
    #[serde(alias = "searchType", default = "default_search_type")]
    pub search_type: String,
}

fn default_search_type() -> String {
    "individual".to_string()
}

/// POST /search response
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
    /// Content keys of results that entered the flagged set on this search
    pub newly_flagged: Vec<String>,
    pub duration_ms: u64,
}

/// POST /search
///
/// Empty terms are rejected locally before any network call.
pub async fn run_search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> ApiResult<Json<SearchResponse>> {
    let term = request.search_term.trim();
    if term.is_empty() {
        return Err(ApiError::BadRequest("Search term must not be empty".to_string()));
    }

    let started = std::time::Instant::now();
    let hits = match state.backend.search(term, &request.search_type).await {
        Ok(hits) => hits,
        Err(e) => {
            state.record_error(e.to_string()).await;
            return Err(e.into());
        }
    };
    let duration_ms = started.elapsed().as_millis() as u64;

    // Auto-flag: similarity at or above the threshold enters the flagged
    // set; duplicates are a no-op.
    let threshold = state.config.flag_threshold;
    let mut newly_flagged = Vec::new();
    for hit in &hits {
        if hit.similarity() >= threshold {
            let (key, inserted) = flags::flag_if_absent(&state.db, hit).await?;
            if inserted {
                state.event_bus.emit_lossy(ConsoleEvent::ResultFlagged {
                    key: key.clone(),
                    name: hit.display_name(),
                    similarity: hit.similarity(),
                    timestamp: Utc::now(),
                });
                newly_flagged.push(key);
            }
        }
    }

    let top_similarity = hits
        .iter()
        .filter_map(|h| h.similarity_percentage)
        .fold(None::<f64>, |acc, s| Some(acc.map_or(s, |a| a.max(s))));
    history::record_search(
        &state.db,
        term,
        &request.search_type,
        hits.len(),
        top_similarity,
        duration_ms,
    )
    .await?;

    tracing::info!(
        term = %term,
        matches = hits.len(),
        flagged = newly_flagged.len(),
        duration_ms,
        "Search completed"
    );

    Ok(Json(SearchResponse {
        results: hits,
        newly_flagged,
        duration_ms,
    }))
}

/// Build search routes
pub fn search_routes() -> Router<AppState> {
    Router::new().route("/search", post(run_search))
}
