//! screendesk-console library interface
//!
//! Exposes public APIs for integration testing

pub mod api;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use screendesk_common::config::ConsoleConfig;
use screendesk_common::events::EventBus;
use screendesk_common::{Error, Result};

use crate::models::ScreeningSession;
use crate::services::{BackendClient, IndexClient};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Client-side store (flagged set, clear history, search history, kv)
    pub db: SqlitePool,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Console configuration
    pub config: Arc<ConsoleConfig>,
    /// Compliance backend client
    pub backend: Arc<BackendClient>,
    /// Search index client
    pub index: Arc<IndexClient>,
    /// In-memory screening sessions
    pub sessions: Arc<RwLock<HashMap<Uuid, ScreeningSession>>>,
    /// Cancellation tokens for running screening sessions
    pub cancellation_tokens: Arc<RwLock<HashMap<Uuid, CancellationToken>>>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(db: SqlitePool, event_bus: EventBus, config: ConsoleConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.request_timeout_secs);

        let backend = BackendClient::new(&config.backend_base_url, timeout)
            .map_err(|e| Error::Config(format!("Backend client: {}", e)))?;
        let index = IndexClient::new(&config.index_base_url, &config.index_name, timeout)
            .map_err(|e| Error::Config(format!("Index client: {}", e)))?;

        Ok(Self {
            db,
            event_bus,
            config: Arc::new(config),
            backend: Arc::new(backend),
            index: Arc::new(index),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            cancellation_tokens: Arc::new(RwLock::new(HashMap::new())),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        })
    }

    /// Record a diagnostic error for the health endpoint
    pub async fn record_error(&self, message: String) {
        *self.last_error.write().await = Some(message);
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        // UI route (HTML page)
        .merge(api::ui_routes())
        // API routes
        .merge(api::screening_routes())
        .merge(api::search_routes())
        .merge(api::flag_routes())
        .merge(api::import_routes())
        .merge(api::audit_routes())
        .merge(api::report_routes())
        .merge(api::health_routes())
        .route("/events", get(api::event_stream))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}
