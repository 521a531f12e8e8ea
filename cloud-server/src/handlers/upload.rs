//! Upload handler

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fileguard_core::Outcome;
use serde_json::json;

use crate::models::ExistingFile;
use crate::{AppError, AppResult, AppState};

/// Multipart field carrying the file
const FILE_FIELD: &str = "file";

/// Classify and store one upload
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await?;
        upload = Some((filename, data));
        break;
    }

    let Some((filename, data)) = upload else {
        return Err(AppError::ValidationError("No file provided".to_string()));
    };
    if filename.is_empty() {
        return Err(AppError::ValidationError("No file selected".to_string()));
    }

    let outcome = state.engine.ingest(&data, &filename, state.clock.now()).await?;
    tracing::info!(filename = %filename, size = data.len(), outcome = outcome.label(), "upload classified");

    let response = match outcome {
        Outcome::Accepted { id, .. } => (
            StatusCode::OK,
            Json(json!({
                "message": "File uploaded successfully!",
                "fileId": id,
            })),
        ),
        Outcome::RejectedAnomaly { details } => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "Anomaly detected!",
                "details": details,
            })),
        ),
        Outcome::RejectedDuplicate { existing, similarity } => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "Duplicate file detected!",
                "existingFile": ExistingFile::from(existing.as_ref()),
                "similarity": similarity,
            })),
        ),
    };

    Ok(response.into_response())
}
