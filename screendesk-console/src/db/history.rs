//! Search history store and report aggregates
//!
//! One row per completed ad-hoc search, covering what the original kept in
//! its `searchHistory` and `searchTimings` keys. The report summary reads
//! these rows; it never invents numbers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Pool, Sqlite};

use screendesk_common::{Error, Result};

/// One recorded search
#[derive(Debug, Clone, Serialize)]
pub struct SearchRecord {
    pub term: String,
    pub search_type: String,
    pub match_count: i64,
    /// Highest similarity among the returned hits, if any carried one
    pub top_similarity: Option<f64>,
    pub duration_ms: i64,
    pub searched_at: DateTime<Utc>,
}

/// Dashboard aggregates computed from the store
///
/// `match_rate` is the percentage of recorded searches whose top similarity
/// met the flag threshold.
#[derive(Debug, Clone, Serialize)]
pub struct SearchStats {
    pub total_searches: i64,
    pub average_duration_ms: Option<f64>,
    pub match_rate: f64,
}

/// Record a completed search
pub async fn record_search(
    db: &Pool<Sqlite>,
    term: &str,
    search_type: &str,
    match_count: usize,
    top_similarity: Option<f64>,
    duration_ms: u64,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO search_history (term, search_type, match_count, top_similarity, duration_ms, searched_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(term)
    .bind(search_type)
    .bind(match_count as i64)
    .bind(top_similarity)
    .bind(duration_ms as i64)
    .bind(Utc::now().to_rfc3339())
    .execute(db)
    .await
    .map_err(Error::Database)?;

    Ok(())
}

/// Most recent searches, newest first
pub async fn recent_searches(db: &Pool<Sqlite>, limit: i64) -> Result<Vec<SearchRecord>> {
    let rows: Vec<(String, String, i64, Option<f64>, i64, String)> = sqlx::query_as(
        "SELECT term, search_type, match_count, top_similarity, duration_ms, searched_at
         FROM search_history ORDER BY id DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(db)
    .await
    .map_err(Error::Database)?;

    rows.into_iter()
        .map(|(term, search_type, match_count, top_similarity, duration_ms, searched_at)| {
            let searched_at = DateTime::parse_from_rfc3339(&searched_at)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| Error::Corrupt(format!("timestamp: {}", e)))?;
            Ok(SearchRecord {
                term,
                search_type,
                match_count,
                top_similarity,
                duration_ms,
                searched_at,
            })
        })
        .collect()
}

/// Aggregate stats for the report summary
pub async fn search_stats(db: &Pool<Sqlite>, flag_threshold: f64) -> Result<SearchStats> {
    let (total, average_duration_ms): (i64, Option<f64>) =
        sqlx::query_as("SELECT COUNT(*), AVG(duration_ms) FROM search_history")
            .fetch_one(db)
            .await
            .map_err(Error::Database)?;

    let above_threshold: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM search_history WHERE top_similarity IS NOT NULL AND top_similarity >= ?",
    )
    .bind(flag_threshold)
    .fetch_one(db)
    .await
    .map_err(Error::Database)?;

    let match_rate = if total == 0 {
        0.0
    } else {
        (above_threshold as f64 / total as f64) * 100.0
    };

    Ok(SearchStats {
        total_searches: total,
        average_duration_ms,
        match_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_pool;

    #[tokio::test]
    async fn records_come_back_newest_first() {
        let pool = init_memory_pool().await.unwrap();
        record_search(&pool, "first", "individual", 0, None, 120).await.unwrap();
        record_search(&pool, "second", "individual", 3, Some(95.0), 80).await.unwrap();

        let recent = recent_searches(&pool, 10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].term, "second");
        assert_eq!(recent[0].top_similarity, Some(95.0));
    }

    #[tokio::test]
    async fn match_rate_counts_threshold_crossings_only() {
        let pool = init_memory_pool().await.unwrap();
        record_search(&pool, "a", "individual", 5, Some(95.0), 100).await.unwrap();
        record_search(&pool, "b", "individual", 2, Some(60.0), 100).await.unwrap();
        record_search(&pool, "c", "individual", 0, None, 100).await.unwrap();
        record_search(&pool, "d", "individual", 1, Some(90.0), 100).await.unwrap();

        let stats = search_stats(&pool, 90.0).await.unwrap();
        assert_eq!(stats.total_searches, 4);
        assert!((stats.match_rate - 50.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn empty_history_yields_zeroed_stats() {
        let pool = init_memory_pool().await.unwrap();
        let stats = search_stats(&pool, 90.0).await.unwrap();
        assert_eq!(stats.total_searches, 0);
        assert_eq!(stats.match_rate, 0.0);
        assert!(stats.average_duration_ms.is_none());
    }
}
