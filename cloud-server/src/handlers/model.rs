//! Anomaly model handlers

use axum::{extract::State, Json};
use fileguard_core::ModelInfo;

use crate::{AppResult, AppState};

/// Retrain from current catalog history
pub async fn retrain(State(state): State<AppState>) -> AppResult<Json<ModelInfo>> {
    let info = state.engine.reinitialize_model().await?;
    tracing::info!(source = ?info.source, samples = info.samples, "anomaly model retrained");
    Ok(Json(info))
}
