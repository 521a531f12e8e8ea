//! File listing & retrieval handlers

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use fileguard_core::FileRecord;
use uuid::Uuid;

use crate::models::FileView;
use crate::{AppError, AppResult, AppState};

fn not_found() -> AppError {
    AppError::NotFound("File not found".to_string())
}

async fn load(state: &AppState, id: &str) -> AppResult<FileRecord> {
    // A malformed id cannot name a stored file
    let id = Uuid::parse_str(id).map_err(|_| not_found())?;
    state.catalog.find_by_id(id).await?.ok_or_else(not_found)
}

async fn load_bytes(state: &AppState, record: &FileRecord) -> AppResult<Vec<u8>> {
    state
        .content
        .get(&record.blob_ref)
        .await?
        .ok_or_else(|| AppError::InternalError(format!("blob {} missing for file {}", record.blob_ref, record.id)))
}

/// Header-safe attachment filename
fn disposition(filename: &str) -> String {
    let safe: String = filename
        .chars()
        .map(|c| if c == '"' || c == '\\' || c.is_control() { '_' } else { c })
        .collect();
    format!("attachment; filename=\"{}\"", safe)
}

/// List all files, newest first
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<FileView>>> {
    let zone = state.config.timezone;
    let files = state
        .catalog
        .list_files(None)
        .await?
        .into_iter()
        .map(|record| FileView::new(record, &zone))
        .collect();
    Ok(Json(files))
}

/// Get single file
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<FileView>> {
    let record = load(&state, &id).await?;
    Ok(Json(FileView::new(record, &state.config.timezone)))
}

/// Download file bytes as an attachment
pub async fn download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let record = load(&state, &id).await?;
    let bytes = load_bytes(&state, &record).await?;

    Ok((
        [
            (header::CONTENT_TYPE, record.content_type.clone()),
            (header::CONTENT_DISPOSITION, disposition(&record.filename)),
        ],
        bytes,
    )
        .into_response())
}

/// Inline preview, images only
pub async fn preview(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let record = load(&state, &id).await?;
    if !record.is_image() {
        return Err(AppError::ValidationError("Not an image file".to_string()));
    }
    let bytes = load_bytes(&state, &record).await?;

    Ok(([(header::CONTENT_TYPE, record.content_type.clone())], bytes).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disposition_escapes_quotes() {
        assert_eq!(disposition("a.txt"), "attachment; filename=\"a.txt\"");
        assert_eq!(disposition("a\"b.txt"), "attachment; filename=\"a_b.txt\"");
    }
}
