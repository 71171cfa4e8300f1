//! Batch screening pipeline
//!
//! Translates parsed rows into scored match results: one fuzzy query per
//! row against the search index, bounded concurrency, output order equal to
//! input order regardless of completion order. A row failure is recorded on
//! that row alone and never aborts the batch.
//!
//! The pipeline is pure with respect to the UI: progress flows through the
//! `ProgressSink` seam and match queries through `MatchSource`, so the whole
//! thing is testable without a network or a browser.

use futures::stream::{self, StreamExt};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::models::{BatchResult, CandidateMatch, RowRecord, NOT_APPLICABLE};
use crate::services::index_client::{MatchSource, TOP_K};

/// Error markers written onto individual rows
pub(crate) const ERR_CANCELLED: &str = "screening cancelled";
pub(crate) const ERR_DEADLINE: &str = "batch deadline exceeded";
pub(crate) const ERR_ROW_TIMEOUT: &str = "match query timed out";
pub(crate) const ERR_NO_NAME: &str = "row has no name field";

/// Per-row completion notice handed to the progress adapter
#[derive(Debug, Clone)]
pub struct RowUpdate {
    pub row_index: usize,
    pub total_rows: usize,
    pub name: String,
    pub match_count: usize,
    pub errored: bool,
}

/// Progress reporting seam
///
/// The service adapts this onto the event bus; tests use `NoopSink`.
pub trait ProgressSink: Send + Sync {
    fn row_screened(&self, update: RowUpdate) -> impl Future<Output = ()> + Send;
}

/// Sink that discards progress
pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn row_screened(&self, _update: RowUpdate) -> impl Future<Output = ()> + Send {
        async {}
    }
}

/// Bounded-concurrency batch screener
pub struct BatchScreener<S> {
    source: Arc<S>,
    concurrency: usize,
    row_timeout: Duration,
    batch_deadline: Duration,
}

impl<S: MatchSource + 'static> BatchScreener<S> {
    pub fn new(
        source: Arc<S>,
        concurrency: usize,
        row_timeout: Duration,
        batch_deadline: Duration,
    ) -> Self {
        Self {
            source,
            concurrency: concurrency.max(1),
            row_timeout,
            batch_deadline,
        }
    }

    /// Screen a batch of rows
    ///
    /// Returns exactly one `BatchResult` per input row, in input order.
    /// Rows share no mutable state; up to `concurrency` queries are in
    /// flight at once. Cancellation and the batch deadline turn unprocessed
    /// rows into error markers rather than dropping them.
    pub async fn screen<P: ProgressSink>(
        &self,
        rows: Vec<RowRecord>,
        cancel: &CancellationToken,
        progress: &P,
    ) -> Vec<BatchResult> {
        let total_rows = rows.len();
        let deadline = Instant::now() + self.batch_deadline;

        stream::iter(rows)
            .map(|row| {
                let source = Arc::clone(&self.source);
                let cancel = cancel.clone();
                let row_timeout = self.row_timeout;
                async move { screen_row(source, row, row_timeout, deadline, cancel).await }
            })
            .buffered(self.concurrency)
            .enumerate()
            .then(|(row_index, result)| async move {
                progress
                    .row_screened(RowUpdate {
                        row_index,
                        total_rows,
                        name: result.name.clone(),
                        match_count: result.matches.len(),
                        errored: result.errored(),
                    })
                    .await;
                result
            })
            .collect()
            .await
    }
}

/// Screen one row against the match source
async fn screen_row<S: MatchSource>(
    source: Arc<S>,
    row: RowRecord,
    row_timeout: Duration,
    deadline: Instant,
    cancel: CancellationToken,
) -> BatchResult {
    // Rows without a name-like field are kept, deterministically, as an
    // errored result with an empty match list.
    let Some(name) = row.display_name().map(str::to_string) else {
        return error_result(NOT_APPLICABLE, ERR_NO_NAME);
    };

    if cancel.is_cancelled() {
        return error_result(&name, ERR_CANCELLED);
    }

    let remaining = deadline.saturating_duration_since(Instant::now());
    if remaining.is_zero() {
        return error_result(&name, ERR_DEADLINE);
    }
    let effective_timeout = row_timeout.min(remaining);

    tokio::select! {
        _ = cancel.cancelled() => error_result(&name, ERR_CANCELLED),

        outcome = tokio::time::timeout(effective_timeout, source.top_matches(&name)) => {
            match outcome {
                Ok(Ok(hits)) => aggregate(&name, hits),
                Ok(Err(e)) => error_result(&name, &e.to_string()),
                Err(_) if effective_timeout < row_timeout => {
                    error_result(&name, ERR_DEADLINE)
                }
                Err(_) => error_result(&name, ERR_ROW_TIMEOUT),
            }
        }
    }
}

/// Assemble raw hits into the shape the view consumes
///
/// Pure function: sorts by descending score and keeps the top five. Output
/// field names are stable regardless of which optional fields each hit
/// carries.
pub fn aggregate(row_name: &str, mut hits: Vec<CandidateMatch>) -> BatchResult {
    hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    hits.truncate(TOP_K);
    BatchResult {
        name: row_name.to_string(),
        matches: hits,
        error: None,
    }
}

fn error_result(name: &str, error: &str) -> BatchResult {
    BatchResult {
        name: name.to_string(),
        matches: Vec::new(),
        error: Some(error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CandidateData;
    use crate::services::index_client::IndexError;
    use std::collections::HashMap;

    /// Scripted match source: name → canned outcome, with optional delay
    struct ScriptedSource {
        outcomes: HashMap<String, Result<Vec<CandidateMatch>, String>>,
        delays: HashMap<String, Duration>,
    }

    impl ScriptedSource {
        fn new() -> Self {
            Self {
                outcomes: HashMap::new(),
                delays: HashMap::new(),
            }
        }

        fn hit(score: f64, full_name: &str) -> CandidateMatch {
            CandidateMatch {
                score,
                data: CandidateData {
                    full_name: Some(full_name.to_string()),
                    ..Default::default()
                },
            }
        }

        fn with_hits(mut self, name: &str, scores: &[f64]) -> Self {
            let hits = scores.iter().map(|s| Self::hit(*s, name)).collect();
            self.outcomes.insert(name.to_string(), Ok(hits));
            self
        }

        fn with_failure(mut self, name: &str, error: &str) -> Self {
            self.outcomes.insert(name.to_string(), Err(error.to_string()));
            self
        }

        fn with_delay(mut self, name: &str, delay: Duration) -> Self {
            self.delays.insert(name.to_string(), delay);
            self
        }
    }

    impl MatchSource for ScriptedSource {
        fn top_matches(
            &self,
            name: &str,
        ) -> impl Future<Output = Result<Vec<CandidateMatch>, IndexError>> + Send {
            let outcome = self.outcomes.get(name).cloned();
            let delay = self.delays.get(name).copied();
            async move {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                match outcome {
                    Some(Ok(hits)) => Ok(hits),
                    Some(Err(e)) => Err(IndexError::Network(e)),
                    None => Ok(Vec::new()),
                }
            }
        }
    }

    fn row(name: &str) -> RowRecord {
        RowRecord::from_pairs(vec![("name".to_string(), name.to_string())])
    }

    fn screener(source: ScriptedSource, concurrency: usize) -> BatchScreener<ScriptedSource> {
        BatchScreener::new(
            Arc::new(source),
            concurrency,
            Duration::from_millis(200),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn one_result_per_row_in_input_order() {
        let source = ScriptedSource::new()
            .with_hits("Alpha", &[3.0])
            .with_hits("Beta", &[2.0])
            .with_hits("Gamma", &[1.0]);
        let screener = screener(source, 2);

        let results = screener
            .screen(vec![row("Alpha"), row("Beta"), row("Gamma")], &CancellationToken::new(), &NoopSink)
            .await;

        let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Beta", "Gamma"]);
    }

    #[tokio::test]
    async fn output_order_is_stable_under_out_of_order_completion() {
        // First row resolves last; ordering must still match the input.
        let source = ScriptedSource::new()
            .with_hits("Slow", &[1.0])
            .with_delay("Slow", Duration::from_millis(80))
            .with_hits("Fast", &[2.0])
            .with_hits("Faster", &[3.0]);
        let screener = screener(source, 3);

        let results = screener
            .screen(vec![row("Slow"), row("Fast"), row("Faster")], &CancellationToken::new(), &NoopSink)
            .await;

        let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Slow", "Fast", "Faster"]);
    }

    #[tokio::test]
    async fn matches_are_truncated_to_five_and_non_increasing() {
        let source =
            ScriptedSource::new().with_hits("Alpha", &[1.0, 9.0, 4.0, 7.0, 2.0, 8.0, 3.0]);
        let screener = screener(source, 1);

        let results = screener
            .screen(vec![row("Alpha")], &CancellationToken::new(), &NoopSink)
            .await;

        let matches = &results[0].matches;
        assert_eq!(matches.len(), 5);
        for pair in matches.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert_eq!(matches[0].score, 9.0);
    }

    #[tokio::test]
    async fn single_row_failure_does_not_abort_the_batch() {
        let source = ScriptedSource::new()
            .with_hits("Alpha", &[3.0])
            .with_failure("Beta", "connection refused")
            .with_hits("Gamma", &[1.0]);
        let screener = screener(source, 2);

        let results = screener
            .screen(vec![row("Alpha"), row("Beta"), row("Gamma")], &CancellationToken::new(), &NoopSink)
            .await;

        assert_eq!(results.len(), 3);
        assert!(!results[0].errored());
        assert!(results[1].errored());
        assert!(results[1].matches.is_empty());
        assert!(!results[2].errored());
        assert_eq!(results[2].matches.len(), 1);
    }

    #[tokio::test]
    async fn rows_without_a_name_field_are_kept_deterministically() {
        let source = ScriptedSource::new().with_hits("Alpha", &[3.0]);
        let screener = screener(source, 1);

        let nameless = RowRecord::from_pairs(vec![("country".to_string(), "GB".to_string())]);
        let results = screener
            .screen(vec![row("Alpha"), nameless], &CancellationToken::new(), &NoopSink)
            .await;

        assert_eq!(results.len(), 2);
        assert!(results[1].errored());
        assert!(results[1].matches.is_empty());
        assert_eq!(results[1].name, NOT_APPLICABLE);
    }

    #[tokio::test]
    async fn slow_query_hits_the_row_timeout() {
        let source = ScriptedSource::new()
            .with_hits("Slow", &[1.0])
            .with_delay("Slow", Duration::from_secs(10));
        let screener = screener(source, 1);

        let results = screener
            .screen(vec![row("Slow")], &CancellationToken::new(), &NoopSink)
            .await;

        assert!(results[0].errored());
        assert_eq!(results[0].error.as_deref(), Some("match query timed out"));
    }

    #[tokio::test]
    async fn cancelled_token_marks_remaining_rows() {
        let source = ScriptedSource::new().with_hits("Alpha", &[1.0]);
        let screener = screener(source, 1);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let results = screener.screen(vec![row("Alpha")], &cancel, &NoopSink).await;

        assert!(results[0].errored());
        assert_eq!(results[0].error.as_deref(), Some("screening cancelled"));
    }

    #[tokio::test]
    async fn progress_sink_sees_every_row() {
        use std::sync::Mutex;

        struct CountingSink(Mutex<Vec<RowUpdate>>);
        impl ProgressSink for CountingSink {
            fn row_screened(&self, update: RowUpdate) -> impl Future<Output = ()> + Send {
                self.0.lock().unwrap().push(update);
                async {}
            }
        }

        let source = ScriptedSource::new()
            .with_hits("Alpha", &[3.0])
            .with_failure("Beta", "boom");
        let screener = screener(source, 2);
        let sink = CountingSink(Mutex::new(Vec::new()));

        screener
            .screen(vec![row("Alpha"), row("Beta")], &CancellationToken::new(), &sink)
            .await;

        let updates = sink.0.into_inner().unwrap();
        assert_eq!(updates.len(), 2);
        assert!(!updates[0].errored);
        assert!(updates[1].errored);
        assert_eq!(updates[1].total_rows, 2);
    }

    #[test]
    fn aggregate_is_pure_and_stable() {
        let hits = vec![
            CandidateMatch { score: 1.0, data: CandidateData::default() },
            CandidateMatch { score: 5.0, data: CandidateData::default() },
        ];
        let result = aggregate("John Smith", hits);
        assert_eq!(result.name, "John Smith");
        assert_eq!(result.matches[0].score, 5.0);
        assert!(result.error.is_none());
    }
}
