//! screendesk-console - Screening Console Service
//!
//! Local web service presenting the compliance screening console: batch CSV
//! screening against the external search index, ad-hoc name search via the
//! compliance backend, flag review, imports and audit views.

use anyhow::Result;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use screendesk_common::config::{ensure_root_folder, resolve_root_folder, ConsoleConfig};
use screendesk_common::events::EventBus;
use screendesk_console::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting screendesk-console");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Step 1: Resolve root folder (CLI arg → env → OS default)
    let cli_root = std::env::args().nth(1);
    let root_folder = resolve_root_folder(cli_root.as_deref());
    info!("Root folder: {}", root_folder.display());

    // Step 2: Create root folder if missing, locate the store database
    let db_path = ensure_root_folder(&root_folder)
        .map_err(|e| anyhow::anyhow!("Failed to initialize root folder: {}", e))?;

    // Step 3: Load configuration (TOML + env overrides)
    let config = ConsoleConfig::load(&root_folder)
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    info!("Backend: {}", config.backend_base_url);
    info!("Search index: {}/{}", config.index_base_url, config.index_name);

    // Step 4: Open or create the store
    info!("Store: {}", db_path.display());
    let db_pool = screendesk_console::db::init_store_pool(&db_path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open store: {}", e))?;
    info!("Store connection established");

    // Event bus for SSE broadcasting
    let event_bus = EventBus::new(100);
    info!("Event bus initialized");

    let listen_port = config.listen_port;
    let state = AppState::new(db_pool, event_bus, config)
        .map_err(|e| anyhow::anyhow!("Failed to build application state: {}", e))?;

    let app = screendesk_console::build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", listen_port)).await?;
    info!("Listening on http://127.0.0.1:{}", listen_port);
    info!("Health check: http://127.0.0.1:{}/health", listen_port);

    axum::serve(listener, app).await?;

    Ok(())
}
