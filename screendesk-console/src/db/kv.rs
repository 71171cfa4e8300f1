//! JSON key-value store
//!
//! Holds the scalar keys the original console scattered across browser
//! storage. Values are JSON-serialized; an absent key is "empty", never an
//! error.

use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::{Pool, Sqlite};

use screendesk_common::{Error, Result};

use crate::models::AuditLogEntry;

/// Cached copy of the backend audit trail, served when the backend is down
pub const KEY_CACHED_AUDIT_LOGS: &str = "cached_audit_logs";

/// Read a JSON value, `None` when the key is absent
pub async fn get_json<T: DeserializeOwned>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>> {
    let row: Option<(String,)> = sqlx::query_as("SELECT value_json FROM kv WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await
        .map_err(Error::Database)?;

    match row {
        Some((value_json,)) => {
            let parsed = serde_json::from_str(&value_json)
                .map_err(|e| Error::Corrupt(format!("key {}: {}", key, e)))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Write a JSON value (upsert)
pub async fn set_json<T: Serialize>(db: &Pool<Sqlite>, key: &str, value: &T) -> Result<()> {
    let value_json = serde_json::to_string(value)
        .map_err(|e| Error::Internal(format!("Serialize value for key {} failed: {}", key, e)))?;

    sqlx::query(
        "INSERT INTO kv (key, value_json) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json",
    )
    .bind(key)
    .bind(&value_json)
    .execute(db)
    .await
    .map_err(Error::Database)?;

    Ok(())
}

/// Cached copy of the backend audit logs, empty when never cached
pub async fn cached_audit_logs(db: &Pool<Sqlite>) -> Result<Vec<AuditLogEntry>> {
    Ok(get_json(db, KEY_CACHED_AUDIT_LOGS).await?.unwrap_or_default())
}

/// Replace the cached audit logs
pub async fn cache_audit_logs(db: &Pool<Sqlite>, entries: &[AuditLogEntry]) -> Result<()> {
    set_json(db, KEY_CACHED_AUDIT_LOGS, &entries).await
}
