//! Audit handlers

use axum::{extract::State, http::StatusCode, Json};

use secops_core::logic::audit::AuditReport;

use crate::{AppState, AppResult, AppError};

fn no_audit() -> AppError {
    AppError::NotFound("No audit has been started".to_string())
}

/// Start a new audit in the active slot
pub async fn start(State(state): State<AppState>) -> AppResult<(StatusCode, Json<AuditReport>)> {
    let run = state.engine.start_audit()?;
    tracing::info!("Audit {} started via API", run.id);
    Ok((StatusCode::ACCEPTED, Json(run.report())))
}

/// Snapshot of the active audit
pub async fn current(State(state): State<AppState>) -> AppResult<Json<AuditReport>> {
    let run = state.engine.current_audit().ok_or_else(no_audit)?;
    Ok(Json(run.report()))
}

/// Request cancellation of the active audit
pub async fn cancel(State(state): State<AppState>) -> AppResult<Json<AuditReport>> {
    let run = state.engine.cancel_audit().ok_or_else(no_audit)?;
    tracing::info!("Audit {} cancellation requested", run.id);
    Ok(Json(run.report()))
}
