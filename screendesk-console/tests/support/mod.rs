//! Shared helpers for integration tests
#![allow(dead_code)]

use axum::Router;
use screendesk_common::config::ConsoleConfig;
use screendesk_common::events::EventBus;
use screendesk_console::AppState;

/// A loopback address nothing listens on; connections fail fast
pub const UNREACHABLE: &str = "http://127.0.0.1:9";

/// App state with an in-memory store and the given collaborator URLs
pub async fn test_state_with(backend_url: &str, index_url: &str) -> AppState {
    test_state_configured(backend_url, index_url, |_| {}).await
}

/// Like `test_state_with`, with a hook to adjust the config first
pub async fn test_state_configured(
    backend_url: &str,
    index_url: &str,
    configure: impl FnOnce(&mut ConsoleConfig),
) -> AppState {
    let pool = screendesk_console::db::init_memory_pool().await.unwrap();
    let mut config = ConsoleConfig {
        backend_base_url: backend_url.to_string(),
        index_base_url: index_url.to_string(),
        request_timeout_secs: 2,
        row_timeout_secs: 2,
        batch_deadline_secs: 30,
        ..Default::default()
    };
    configure(&mut config);
    AppState::new(pool, EventBus::new(100), config).unwrap()
}

/// App state whose collaborators are unreachable
pub async fn test_state() -> AppState {
    test_state_with(UNREACHABLE, UNREACHABLE).await
}

/// Serve a fake collaborator on an ephemeral port, returning its base URL
pub async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Build a multipart/form-data body with one part per (filename, bytes)
pub fn multipart_body(parts: &[(&str, &[u8])]) -> (String, Vec<u8>) {
    let boundary = "screendesk-test-boundary";
    let mut body = Vec::new();
    for (filename, bytes) in parts {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                boundary, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    (
        format!("multipart/form-data; boundary={}", boundary),
        body,
    )
}
