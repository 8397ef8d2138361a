use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::logic::error::{EngineError, EngineResult};
use crate::logic::threat::ThreatAnalysis;

// ============================================================================
// ENUMS
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentCategory {
    Fraud,
    Malware,
    Phishing,
    Espionage,
    Opsec,
    #[default]
    Other,
}

impl IncidentCategory {
    pub const ALL: [IncidentCategory; 6] = [
        IncidentCategory::Fraud,
        IncidentCategory::Malware,
        IncidentCategory::Phishing,
        IncidentCategory::Espionage,
        IncidentCategory::Opsec,
        IncidentCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentCategory::Fraud => "fraud",
            IncidentCategory::Malware => "malware",
            IncidentCategory::Phishing => "phishing",
            IncidentCategory::Espionage => "espionage",
            IncidentCategory::Opsec => "opsec",
            IncidentCategory::Other => "other",
        }
    }
}

impl std::fmt::Display for IncidentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }

    pub fn level(&self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
            Priority::Critical => 4,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle: Analyzing -> Confirmed -> Mitigated -> Closed (forward only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentStatus {
    Analyzing,
    Confirmed,
    Mitigated,
    Closed,
}

impl IncidentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentStatus::Analyzing => "analyzing",
            IncidentStatus::Confirmed => "confirmed",
            IncidentStatus::Mitigated => "mitigated",
            IncidentStatus::Closed => "closed",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            IncidentStatus::Analyzing => 0,
            IncidentStatus::Confirmed => 1,
            IncidentStatus::Mitigated => 2,
            IncidentStatus::Closed => 3,
        }
    }

    /// The only status this one may move to, if any
    pub fn next(&self) -> Option<IncidentStatus> {
        match self {
            IncidentStatus::Analyzing => Some(IncidentStatus::Confirmed),
            IncidentStatus::Confirmed => Some(IncidentStatus::Mitigated),
            IncidentStatus::Mitigated => Some(IncidentStatus::Closed),
            IncidentStatus::Closed => None,
        }
    }

    /// Exactly one step forward. No skip-ahead, no reopen.
    pub fn can_transition_to(&self, target: IncidentStatus) -> bool {
        self.next() == Some(target)
    }

    pub fn is_terminal(&self) -> bool {
        *self == IncidentStatus::Closed
    }
}

impl PartialOrd for IncidentStatus {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IncidentStatus {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl std::fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// INCIDENT
// ============================================================================

/// One line of the incident's activity log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub at: DateTime<Utc>,
    pub action: String,
    pub actor: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    pub id: Uuid,
    pub title: String,
    pub category: IncidentCategory,
    pub priority: Priority,
    pub status: IncidentStatus,
    pub reported_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    pub description: Option<String>,
    pub affected_systems: Vec<String>,
    pub assignee: Option<String>,

    /// Append-only
    pub evidence_refs: Vec<String>,
    /// Absent until the first evidence submission is analyzed
    pub analysis: Option<ThreatAnalysis>,

    pub timeline: Vec<TimelineEntry>,
}

/// Creation request. `priority = None` means "use the configured default".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewIncident {
    pub title: String,
    pub category: IncidentCategory,
    pub priority: Option<Priority>,
    pub reported_by: String,
    #[serde(default)]
    pub evidence_refs: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub affected_systems: Vec<String>,
}

impl Incident {
    pub(crate) fn new(req: NewIncident, default_priority: Priority) -> EngineResult<Self> {
        let title = req.title.trim().to_string();
        if title.is_empty() {
            return Err(EngineError::invalid_config("incident title must not be empty"));
        }

        let reported_by = if req.reported_by.trim().is_empty() {
            "unknown".to_string()
        } else {
            req.reported_by.trim().to_string()
        };

        let now = Utc::now();
        let mut incident = Self {
            id: Uuid::new_v4(),
            title,
            category: req.category,
            priority: req.priority.unwrap_or(default_priority),
            status: IncidentStatus::Analyzing,
            reported_by: reported_by.clone(),
            created_at: now,
            updated_at: now,
            description: req.description.filter(|d| !d.trim().is_empty()),
            affected_systems: req.affected_systems,
            assignee: None,
            evidence_refs: clean_refs(req.evidence_refs),
            analysis: None,
            timeline: Vec::new(),
        };
        incident.record(format!("Incident reported ({})", incident.category), &reported_by);
        Ok(incident)
    }

    pub(crate) fn record(&mut self, action: impl Into<String>, actor: &str) {
        let now = Utc::now();
        self.updated_at = now;
        self.timeline.push(TimelineEntry {
            at: now,
            action: action.into(),
            actor: actor.to_string(),
        });
    }

    /// Forward-only transition. On error nothing is mutated.
    pub(crate) fn transition(&mut self, target: IncidentStatus, actor: &str) -> EngineResult<()> {
        if !self.status.can_transition_to(target) {
            return Err(EngineError::InvalidTransition {
                from: self.status,
                to: target,
            });
        }
        let from = self.status;
        self.status = target;
        self.record(format!("Status changed: {} -> {}", from, target), actor);
        Ok(())
    }

    pub(crate) fn append_evidence(&mut self, refs: Vec<String>, actor: &str) -> usize {
        let refs = clean_refs(refs);
        let added = refs.len();
        if added > 0 {
            self.evidence_refs.extend(refs);
            self.record(format!("{} evidence item(s) submitted", added), actor);
        }
        added
    }

    pub(crate) fn set_analysis(&mut self, analysis: ThreatAnalysis) {
        let action = format!(
            "Threat analysis attached (level {}, confidence {})",
            analysis.threat_level, analysis.confidence
        );
        self.analysis = Some(analysis);
        self.record(action, "system");
    }
}

fn clean_refs(refs: Vec<String>) -> Vec<String> {
    refs.into_iter()
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .collect()
}

// ============================================================================
// QUERY
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncidentFilter {
    pub priority: Option<Priority>,
    pub status: Option<IncidentStatus>,
    pub category: Option<IncidentCategory>,
    #[serde(default)]
    pub order: ListOrder,
}

impl IncidentFilter {
    pub fn matches(&self, incident: &Incident) -> bool {
        self.priority.map_or(true, |p| incident.priority == p)
            && self.status.map_or(true, |s| incident.status == s)
            && self.category.map_or(true, |c| incident.category == c)
    }
}

/// Counts for dashboard widgets
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncidentStats {
    pub total: usize,
    pub analyzing: usize,
    pub confirmed: usize,
    pub mitigated: usize,
    pub closed: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub analyzed: usize,
}

impl IncidentStats {
    pub(crate) fn add(&mut self, incident: &Incident) {
        self.total += 1;
        match incident.status {
            IncidentStatus::Analyzing => self.analyzing += 1,
            IncidentStatus::Confirmed => self.confirmed += 1,
            IncidentStatus::Mitigated => self.mitigated += 1,
            IncidentStatus::Closed => self.closed += 1,
        }
        match incident.priority {
            Priority::Critical => self.critical += 1,
            Priority::High => self.high += 1,
            Priority::Medium => self.medium += 1,
            Priority::Low => self.low += 1,
        }
        if incident.analysis.is_some() {
            self.analyzed += 1;
        }
    }
}
