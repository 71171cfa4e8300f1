//! Import API handlers
//!
//! GET /imports/recent, POST /imports/upload — thin relays to the
//! compliance backend, with all file validation done locally first.

use axum::{
    extract::{Multipart, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::api::screening::validate_tabular_file;
use crate::error::{ApiError, ApiResult};
use crate::models::{ImportRecord, UploadResponse};
use crate::services::UploadFile;
use crate::AppState;

/// Backend limit on files per upload
const MAX_UPLOAD_FILES: usize = 5;

/// GET /imports/recent response
#[derive(Debug, Serialize)]
pub struct RecentImportsResponse {
    pub imports: Vec<ImportRecord>,
}

/// GET /imports/recent
pub async fn recent_imports(State(state): State<AppState>) -> ApiResult<Json<RecentImportsResponse>> {
    let imports = match state.backend.recent_imports().await {
        Ok(imports) => imports,
        Err(e) => {
            state.record_error(e.to_string()).await;
            return Err(e.into());
        }
    };
    Ok(Json(RecentImportsResponse { imports }))
}

/// POST /imports/upload
///
/// Accepts up to five CSV files and forwards them to the backend. Count and
/// type validation happen before any network call; an invalid upload never
/// leaves the console.
pub async fn upload_imports(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let mut files: Vec<UploadFile> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        if files.len() == MAX_UPLOAD_FILES {
            return Err(ApiError::BadRequest(format!(
                "At most {} files per upload",
                MAX_UPLOAD_FILES
            )));
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Unreadable upload: {}", e)))?;

        validate_tabular_file(&filename, &bytes)?;
        files.push(UploadFile {
            filename,
            bytes: bytes.to_vec(),
        });
    }

    if files.is_empty() {
        return Err(ApiError::BadRequest("No files uploaded".to_string()));
    }

    let count = files.len();
    let response = match state.backend.upload_files(files).await {
        Ok(response) => response,
        Err(e) => {
            state.record_error(e.to_string()).await;
            return Err(e.into());
        }
    };

    tracing::info!(files = count, "Import upload forwarded to backend");

    Ok(Json(response))
}

/// Build import routes
pub fn import_routes() -> Router<AppState> {
    Router::new()
        .route("/imports/recent", get(recent_imports))
        .route("/imports/upload", post(upload_imports))
}
