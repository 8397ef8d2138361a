//! Incident request/response models

use serde::{Deserialize, Serialize};
use validator::Validate;

use secops_core::logic::incident::{Incident, IncidentCategory, IncidentStatus, NewIncident, Priority};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateIncidentRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub category: IncidentCategory,
    pub priority: Option<Priority>,
    #[validate(length(max = 100))]
    #[serde(default)]
    pub reported_by: String,
    #[serde(default)]
    pub evidence_refs: Vec<String>,
    #[validate(length(max = 4000))]
    pub description: Option<String>,
    #[serde(default)]
    pub affected_systems: Vec<String>,
}

impl From<CreateIncidentRequest> for NewIncident {
    fn from(req: CreateIncidentRequest) -> Self {
        NewIncident {
            title: req.title,
            category: req.category,
            priority: req.priority,
            reported_by: req.reported_by,
            evidence_refs: req.evidence_refs,
            description: req.description,
            affected_systems: req.affected_systems,
        }
    }
}

/// Evidence submission. An empty list is accepted here and rejected by the
/// engine as insufficient evidence.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitEvidenceRequest {
    pub evidence_refs: Vec<String>,
    #[validate(length(min = 1, max = 100))]
    pub actor: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateIncidentStatus {
    pub status: IncidentStatus,
    #[validate(length(min = 1, max = 100))]
    pub actor: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AssignIncidentRequest {
    #[validate(length(min = 1, max = 100))]
    pub assignee: String,
}

#[derive(Debug, Serialize)]
pub struct IncidentListResponse {
    pub total: usize,
    pub incidents: Vec<Incident>,
}

/// Actor recorded in the timeline when the request names none
pub fn actor_or_default(actor: Option<String>) -> String {
    actor.unwrap_or_else(|| "analyst".to_string())
}
