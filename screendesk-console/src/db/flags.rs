//! Flagged-result store operations
//!
//! Flag insertion is idempotent on the content key. Clearing is
//! transactional: exactly one row leaves the flagged set and exactly one
//! row enters the append-only clear history, or nothing changes at all.

use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite};

use screendesk_common::{Error, Result};

use crate::models::flag::{flag_key, ClearRecord, FlaggedResult};
use crate::models::SearchHit;

/// Flag a hit if it is not already flagged
///
/// Returns the content key and whether a new row was inserted. Duplicate
/// identical hits are a no-op.
pub async fn flag_if_absent(db: &Pool<Sqlite>, hit: &SearchHit) -> Result<(String, bool)> {
    let key = flag_key(hit);
    let hit_json = serde_json::to_string(hit)
        .map_err(|e| Error::Internal(format!("Serialize flagged hit failed: {}", e)))?;

    let inserted = sqlx::query(
        "INSERT INTO flagged_results (key, hit_json, flagged_at) VALUES (?, ?, ?)
         ON CONFLICT(key) DO NOTHING",
    )
    .bind(&key)
    .bind(&hit_json)
    .bind(Utc::now().to_rfc3339())
    .execute(db)
    .await
    .map_err(Error::Database)?
    .rows_affected()
        > 0;

    Ok((key, inserted))
}

/// List the active flagged set
///
/// Order is not part of the contract; rows come back keyed for stable
/// client-side handling.
pub async fn list_flagged(db: &Pool<Sqlite>) -> Result<Vec<FlaggedResult>> {
    let rows: Vec<(String, String, String)> =
        sqlx::query_as("SELECT key, hit_json, flagged_at FROM flagged_results")
            .fetch_all(db)
            .await
            .map_err(Error::Database)?;

    rows.into_iter().map(|(key, hit_json, flagged_at)| {
        Ok(FlaggedResult {
            key,
            hit: decode_hit(&hit_json)?,
            flagged_at: decode_time(&flagged_at)?,
        })
    })
    .collect()
}

/// Clear one flagged result with a reason
///
/// The reason must be non-empty after trimming; that is validated here,
/// before any store mutation. Returns the appended clear record.
pub async fn clear_flag(db: &Pool<Sqlite>, key: &str, reason: &str) -> Result<ClearRecord> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(Error::InvalidInput(
            "A reason is required to clear a flagged result".to_string(),
        ));
    }

    let mut tx = db.begin().await.map_err(Error::Database)?;

    let row: Option<(String,)> =
        sqlx::query_as("SELECT hit_json FROM flagged_results WHERE key = ?")
            .bind(key)
            .fetch_optional(&mut *tx)
            .await
            .map_err(Error::Database)?;

    let Some((hit_json,)) = row else {
        return Err(Error::NotFound(format!("No flagged result with key {}", key)));
    };

    sqlx::query("DELETE FROM flagged_results WHERE key = ?")
        .bind(key)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

    let cleared_at = Utc::now();
    sqlx::query(
        "INSERT INTO clear_history (key, hit_json, reason, cleared_at) VALUES (?, ?, ?, ?)",
    )
    .bind(key)
    .bind(&hit_json)
    .bind(reason)
    .bind(cleared_at.to_rfc3339())
    .execute(&mut *tx)
    .await
    .map_err(Error::Database)?;

    tx.commit().await.map_err(Error::Database)?;

    Ok(ClearRecord {
        key: key.to_string(),
        hit: decode_hit(&hit_json)?,
        reason: reason.to_string(),
        cleared_at,
    })
}

/// List the clear history in insertion order
pub async fn clear_history(db: &Pool<Sqlite>) -> Result<Vec<ClearRecord>> {
    let rows: Vec<(String, String, String, String)> = sqlx::query_as(
        "SELECT key, hit_json, reason, cleared_at FROM clear_history ORDER BY id",
    )
    .fetch_all(db)
    .await
    .map_err(Error::Database)?;

    rows.into_iter()
        .map(|(key, hit_json, reason, cleared_at)| {
            Ok(ClearRecord {
                key,
                hit: decode_hit(&hit_json)?,
                reason,
                cleared_at: decode_time(&cleared_at)?,
            })
        })
        .collect()
}

/// Count active flagged results
pub async fn flagged_count(db: &Pool<Sqlite>) -> Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM flagged_results")
        .fetch_one(db)
        .await
        .map_err(Error::Database)
}

/// Count cleared results
pub async fn cleared_count(db: &Pool<Sqlite>) -> Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM clear_history")
        .fetch_one(db)
        .await
        .map_err(Error::Database)
}

fn decode_hit(hit_json: &str) -> Result<SearchHit> {
    serde_json::from_str(hit_json).map_err(|e| Error::Corrupt(format!("flagged hit: {}", e)))
}

fn decode_time(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Corrupt(format!("timestamp: {}", e)))
}
