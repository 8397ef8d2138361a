//! Scan handlers

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use secops_core::logic::scan::ScanRun;

use crate::{AppState, AppResult, AppError};
use crate::models::StartScanRequest;

fn no_scan() -> AppError {
    AppError::NotFound("No scan has been started".to_string())
}

/// Validate the scan configuration and start it in the active slot
pub async fn start(
    State(state): State<AppState>,
    Json(req): Json<StartScanRequest>,
) -> AppResult<(StatusCode, Json<ScanRun>)> {
    req.validate()?;
    let run = state.engine.start_scan(req.into())?;
    tracing::info!("Scan {} started via API ({} hosts)", run.id, run.hosts_total);
    Ok((StatusCode::ACCEPTED, Json(run)))
}

/// Snapshot of the active scan. Devices appear once it completes.
pub async fn current(State(state): State<AppState>) -> AppResult<Json<ScanRun>> {
    let run = state.engine.current_scan().ok_or_else(no_scan)?;
    Ok(Json(run))
}

pub async fn cancel(State(state): State<AppState>) -> AppResult<Json<ScanRun>> {
    let run = state.engine.cancel_scan().ok_or_else(no_scan)?;
    tracing::info!("Scan {} cancellation requested", run.id);
    Ok(Json(run))
}
