//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    engine_version: &'static str,
    incidents: usize,
    timestamp: i64,
}

pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        engine_version: secops_core::constants::APP_VERSION,
        incidents: state.engine.store().len(),
        timestamp: chrono::Utc::now().timestamp(),
    })
}
