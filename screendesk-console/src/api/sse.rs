//! Server-Sent Events endpoint for console events

use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;

use crate::AppState;

/// GET /events - SSE stream of screening and flag events
///
/// Streams `ScreeningStarted`, `RowScreened`, `ScreeningCompleted`,
/// `ScreeningCancelled`, `ResultFlagged` and `FlagCleared` with heartbeats.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    screendesk_common::sse::event_sse_stream(&state.event_bus)
}
