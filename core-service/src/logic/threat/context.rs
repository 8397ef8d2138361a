//! Threat Context
//!
//! Thông tin bổ sung ngoài evidence list cho scorer.

use serde::{Deserialize, Serialize};

use crate::logic::incident::{Incident, IncidentCategory, Priority};

// ============================================================================
// THREAT CONTEXT
// ============================================================================

/// What the scorer knows about the incident besides the evidence refs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreatContext {
    pub category: IncidentCategory,
    pub priority: Priority,
    /// Free text from the reporter, if any
    pub description: Option<String>,
    /// Number of affected systems listed by the reporter
    pub affected_systems: usize,
    /// Threat level of the analysis being replaced, if any
    pub previous_level: Option<u8>,
}

impl ThreatContext {
    pub fn new(category: IncidentCategory, priority: Priority) -> Self {
        Self {
            category,
            priority,
            description: None,
            affected_systems: 0,
            previous_level: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_affected_systems(mut self, count: usize) -> Self {
        self.affected_systems = count;
        self
    }

    /// Context snapshot of an existing incident
    pub fn from_incident(incident: &Incident) -> Self {
        Self {
            category: incident.category,
            priority: incident.priority,
            description: incident.description.clone(),
            affected_systems: incident.affected_systems.len(),
            previous_level: incident.analysis.as_ref().map(|a| a.threat_level),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_builder() {
        let ctx = ThreatContext::new(IncidentCategory::Espionage, Priority::Critical)
            .with_description("tracking beacon on fleet vehicles")
            .with_affected_systems(3);

        assert_eq!(ctx.category, IncidentCategory::Espionage);
        assert_eq!(ctx.priority, Priority::Critical);
        assert_eq!(ctx.affected_systems, 3);
        assert!(ctx.previous_level.is_none());
    }
}
