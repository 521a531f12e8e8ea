//! Dashboard handler

use axum::{extract::State, Json};
use fileguard_core::DashboardStats;

use crate::{AppResult, AppState};

pub async fn get(State(state): State<AppState>) -> AppResult<Json<DashboardStats>> {
    let stats = state.aggregator.dashboard(state.clock.now()).await?;
    Ok(Json(stats))
}
