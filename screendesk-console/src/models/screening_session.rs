//! Batch screening session state machine
//!
//! A session progresses PARSING → MATCHING → COMPLETED, or ends in
//! CANCELLED (user action) or FAILED (setup or deadline failure).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::batch::BatchResult;

/// Screening workflow state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScreeningState {
    /// Uploaded file is being parsed into rows
    Parsing,
    /// Per-row match queries in flight
    Matching,
    /// All rows screened (individual rows may still carry error markers)
    Completed,
    /// Cancelled by the user
    Cancelled,
    /// Deadline expired before any row was screened
    Failed,
}

impl ScreeningState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ScreeningState::Completed | ScreeningState::Cancelled | ScreeningState::Failed
        )
    }
}

/// Progress tracking for a running session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScreeningProgress {
    /// Rows screened so far
    pub current: usize,
    /// Total rows in the batch
    pub total: usize,
    /// Percentage complete (0.0 - 100.0)
    pub percentage: f64,
}

impl ScreeningProgress {
    pub fn advance(&mut self) {
        self.current += 1;
        self.percentage = if self.total == 0 {
            100.0
        } else {
            (self.current as f64 / self.total as f64) * 100.0
        };
    }
}

/// In-memory state of one batch screening session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningSession {
    pub session_id: Uuid,
    pub state: ScreeningState,
    /// Name of the uploaded file
    pub filename: String,
    pub progress: ScreeningProgress,
    /// One entry per input row, input order; populated as rows finish
    pub results: Vec<BatchResult>,
    /// Session-level error (FAILED state only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl ScreeningSession {
    pub fn new(filename: String, total_rows: usize) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            state: ScreeningState::Parsing,
            filename,
            progress: ScreeningProgress {
                current: 0,
                total: total_rows,
                percentage: 0.0,
            },
            results: Vec::new(),
            error: None,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Transition to a new state, stamping `ended_at` on terminal states
    pub fn transition_to(&mut self, new_state: ScreeningState) {
        self.state = new_state;
        if new_state.is_terminal() {
            self.ended_at = Some(Utc::now());
        }
    }
}
