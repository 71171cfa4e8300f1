//! Event types and broadcast bus for the ScreenDesk console
//!
//! Events are emitted by the screening pipeline and the flagging workflow
//! and forwarded to browser clients over SSE.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Console event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ConsoleEvent {
    /// Batch screening session started
    ScreeningStarted {
        session_id: Uuid,
        total_rows: usize,
        timestamp: DateTime<Utc>,
    },

    /// One row of a batch finished (matched or errored)
    RowScreened {
        session_id: Uuid,
        row_index: usize,
        total_rows: usize,
        name: String,
        match_count: usize,
        errored: bool,
        timestamp: DateTime<Utc>,
    },

    /// Batch screening session finished
    ScreeningCompleted {
        session_id: Uuid,
        rows_matched: usize,
        rows_errored: usize,
        elapsed_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// Batch screening session cancelled by the user
    ScreeningCancelled {
        session_id: Uuid,
        rows_processed: usize,
        timestamp: DateTime<Utc>,
    },

    /// Batch screening session failed before producing results
    ScreeningFailed {
        session_id: Uuid,
        error: String,
        timestamp: DateTime<Utc>,
    },

    /// A search hit crossed the review threshold and entered the flagged set
    ResultFlagged {
        key: String,
        name: String,
        similarity: f64,
        timestamp: DateTime<Utc>,
    },

    /// A flagged result was cleared with a reason
    FlagCleared {
        key: String,
        timestamp: DateTime<Utc>,
    },
}

impl ConsoleEvent {
    /// Event name used as the SSE event type
    pub fn event_type(&self) -> &str {
        match self {
            ConsoleEvent::ScreeningStarted { .. } => "ScreeningStarted",
            ConsoleEvent::RowScreened { .. } => "RowScreened",
            ConsoleEvent::ScreeningCompleted { .. } => "ScreeningCompleted",
            ConsoleEvent::ScreeningCancelled { .. } => "ScreeningCancelled",
            ConsoleEvent::ScreeningFailed { .. } => "ScreeningFailed",
            ConsoleEvent::ResultFlagged { .. } => "ResultFlagged",
            ConsoleEvent::FlagCleared { .. } => "FlagCleared",
        }
    }
}

/// Broadcast bus connecting event producers to SSE streams
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ConsoleEvent>,
    capacity: usize,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    ///
    /// Events emitted while the channel is full displace the oldest
    /// buffered events for lagging subscribers.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<ConsoleEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: ConsoleEvent,
    ) -> Result<usize, broadcast::error::SendError<ConsoleEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring the case where nobody is listening
    ///
    /// Progress events are advisory; a console with no open browser tab
    /// simply drops them.
    pub fn emit_lossy(&self, event: ConsoleEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("event emitted with no subscribers");
        }
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_emitted_event() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.emit_lossy(ConsoleEvent::FlagCleared {
            key: "abc".into(),
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type(), "FlagCleared");
    }

    #[test]
    fn emit_without_subscribers_is_err() {
        let bus = EventBus::new(4);
        let result = bus.emit(ConsoleEvent::FlagCleared {
            key: "abc".into(),
            timestamp: Utc::now(),
        });
        assert!(result.is_err());
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let event = ConsoleEvent::ResultFlagged {
            key: "k1".into(),
            name: "John Smith".into(),
            similarity: 95.0,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "ResultFlagged");
        assert_eq!(json["similarity"], 95.0);
    }
}
