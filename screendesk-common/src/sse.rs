//! Server-Sent Events (SSE) utilities
//!
//! Shared SSE plumbing for the console's event stream.

use crate::events::EventBus;
use axum::response::sse::{Event, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Heartbeat interval for SSE connection status
const HEARTBEAT_SECS: u64 = 15;

/// Create an SSE stream that forwards every bus event to the client
///
/// Sends an initial `ConnectionStatus` event, then interleaves bus events
/// with heartbeats so proxies do not drop the idle connection.
pub fn event_sse_stream(bus: &EventBus) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected to console events");

    let mut rx = bus.subscribe();

    let stream = async_stream::stream! {
        yield Ok(Event::default()
            .event("ConnectionStatus")
            .data("connected"));

        loop {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(HEARTBEAT_SECS)) => {
                    debug!("SSE: Sending heartbeat");
                    yield Ok(Event::default().comment("heartbeat"));
                }

                received = rx.recv() => {
                    match received {
                        Ok(event) => {
                            let event_type = event.event_type().to_string();
                            match serde_json::to_string(&event) {
                                Ok(json) => {
                                    debug!("SSE: Broadcasting event: {}", event_type);
                                    yield Ok(Event::default().event(event_type).data(json));
                                }
                                Err(e) => {
                                    warn!("SSE: Failed to serialize event {}: {}", event_type, e);
                                }
                            }
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!("SSE: Client lagged, {} events skipped", skipped);
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                            debug!("SSE: Event bus closed, ending stream");
                            break;
                        }
                    }
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(HEARTBEAT_SECS))
            .text("heartbeat"),
    )
}
