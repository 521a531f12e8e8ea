//! Health check handler

use axum::{extract::State, Json};
use fileguard_core::ModelInfo;
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: i64,
    model_trained: bool,
    /// Source and size of the current anomaly model, once trained
    model: Option<ModelInfo>,
}

pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: state.clock.now().timestamp(),
        model_trained: state.engine.scorer().is_trained(),
        model: state.engine.scorer().model_info(),
    })
}
