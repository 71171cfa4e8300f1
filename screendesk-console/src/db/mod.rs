//! Client-side store for the console
//!
//! SQLite-backed replacement for the original browser-local bookkeeping.
//! Schema per concern: flagged results, append-only clear history, search
//! history, and a JSON key-value table for the remaining scalar keys.
//! A missing row always means "empty", never an error.

pub mod flags;
pub mod history;
pub mod kv;

use sqlx::SqlitePool;
use std::path::Path;

use screendesk_common::Result;

/// Initialize the store connection pool
///
/// Connects to screendesk.db in the root folder, creating file and tables
/// as needed.
pub async fn init_store_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to store: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    init_tables(&pool).await?;

    Ok(pool)
}

/// Create store tables if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS flagged_results (
            key TEXT PRIMARY KEY,
            hit_json TEXT NOT NULL,
            flagged_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS clear_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            key TEXT NOT NULL,
            hit_json TEXT NOT NULL,
            reason TEXT NOT NULL,
            cleared_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS search_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            term TEXT NOT NULL,
            search_type TEXT NOT NULL,
            match_count INTEGER NOT NULL,
            top_similarity REAL,
            duration_ms INTEGER NOT NULL,
            searched_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value_json TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// In-memory pool with the full schema, used by tests
///
/// A single connection: every pooled connection to `:memory:` would
/// otherwise get its own empty database.
pub async fn init_memory_pool() -> Result<SqlitePool> {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await?;
    init_tables(&pool).await?;
    Ok(pool)
}
