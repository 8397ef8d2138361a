//! Incidents handlers

use axum::{extract::{State, Path, Query}, http::StatusCode, Json};
use uuid::Uuid;
use validator::Validate;

use secops_core::logic::incident::{Incident, IncidentFilter, IncidentStats};

use crate::{AppState, AppResult};
use crate::models::{
    actor_or_default, AssignIncidentRequest, CreateIncidentRequest, IncidentListResponse,
    SubmitEvidenceRequest, UpdateIncidentStatus,
};

/// List incidents (filter by status, priority, category; order)
pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<IncidentFilter>,
) -> AppResult<Json<IncidentListResponse>> {
    let incidents = state.engine.list_incidents(&filter);
    Ok(Json(IncidentListResponse {
        total: incidents.len(),
        incidents,
    }))
}

/// Create incident. Evidence given here is analyzed immediately.
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateIncidentRequest>,
) -> AppResult<(StatusCode, Json<Incident>)> {
    req.validate()?;
    let incident = state.engine.create_incident(req.into())?;
    tracing::info!("Incident {} created via API", incident.id);
    Ok((StatusCode::CREATED, Json(incident)))
}

/// Counts by status and priority
pub async fn stats(State(state): State<AppState>) -> Json<IncidentStats> {
    Json(state.engine.incident_stats())
}

/// Get single incident
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Incident>> {
    let incident = state.engine.get_incident(id)?;
    Ok(Json(incident))
}

/// Submit evidence; returns the incident with its fresh analysis
pub async fn submit_evidence(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SubmitEvidenceRequest>,
) -> AppResult<Json<Incident>> {
    req.validate()?;
    let actor = actor_or_default(req.actor);
    let incident = state.engine.submit_evidence(id, req.evidence_refs, &actor)?;
    Ok(Json(incident))
}

/// Advance incident status by one step
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateIncidentStatus>,
) -> AppResult<Json<Incident>> {
    req.validate()?;
    let actor = actor_or_default(req.actor);
    let incident = state.engine.transition(id, req.status, &actor)?;
    Ok(Json(incident))
}

/// Assign an analyst
pub async fn assign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AssignIncidentRequest>,
) -> AppResult<Json<Incident>> {
    req.validate()?;
    let incident = state.engine.assign(id, &req.assignee)?;
    Ok(Json(incident))
}
