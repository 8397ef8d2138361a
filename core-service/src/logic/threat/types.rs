//! Threat Types
//!
//! Core types cho threat analysis.
//! KHÔNG chứa logic scoring - chỉ data structures.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logic::error::{EngineError, EngineResult};

// ============================================================================
// THREAT ANALYSIS (attached to an incident)
// ============================================================================

/// Derived assessment of an incident's evidence.
///
/// Never mutated in place: a new evidence submission produces a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatAnalysis {
    /// Severity of what was found (0 - 100)
    pub threat_level: u8,
    /// Certainty of the assessment (0 - 100)
    pub confidence: u8,
    /// Short labels of what was observed (never empty)
    pub indicators: BTreeSet<String>,
    /// Suggested actions, most urgent first (never empty)
    pub recommendations: Vec<String>,
    /// How many evidence refs went into this analysis
    pub evidence_count: usize,
    /// Scoring strategy that produced the numbers
    pub scorer: String,
    pub analyzed_at: DateTime<Utc>,
}

impl ThreatAnalysis {
    /// Build an analysis, clamping scores to 0-100.
    ///
    /// Fails if either list is empty after trimming.
    pub fn build(
        threat_level: i64,
        confidence: i64,
        indicators: impl IntoIterator<Item = String>,
        recommendations: impl IntoIterator<Item = String>,
        scorer: &str,
        evidence_count: usize,
    ) -> EngineResult<Self> {
        let indicators: BTreeSet<String> = indicators
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if indicators.is_empty() {
            return Err(EngineError::invalid_config("threat analysis needs at least one indicator"));
        }

        let mut recs: Vec<String> = Vec::new();
        for rec in recommendations {
            let rec = rec.trim().to_string();
            if !rec.is_empty() && !recs.contains(&rec) {
                recs.push(rec);
            }
        }
        if recs.is_empty() {
            return Err(EngineError::invalid_config("threat analysis needs at least one recommendation"));
        }

        Ok(Self {
            threat_level: clamp_score(threat_level),
            confidence: clamp_score(confidence),
            indicators,
            recommendations: recs,
            evidence_count,
            scorer: scorer.to_string(),
            analyzed_at: Utc::now(),
        })
    }

    pub fn severity(&self) -> ThreatSeverity {
        ThreatSeverity::from_level(self.threat_level)
    }
}

pub fn clamp_score(value: i64) -> u8 {
    value.clamp(0, 100) as u8
}

// ============================================================================
// RAW ASSESSMENT (from a scorer, before clamping/vocabulary filtering)
// ============================================================================

/// Output of a `ThreatScorer`. Values may be out of range; the analyzer clamps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Assessment {
    pub threat_level: i64,
    pub confidence: i64,
    /// Candidate indicator labels; anything outside the vocabulary is dropped
    pub indicators: Vec<String>,
}

// ============================================================================
// SEVERITY BANDS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ThreatSeverity {
    pub fn from_level(level: u8) -> Self {
        match level {
            80..=u8::MAX => ThreatSeverity::Critical,
            60..=79 => ThreatSeverity::High,
            30..=59 => ThreatSeverity::Medium,
            _ => ThreatSeverity::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatSeverity::Low => "low",
            ThreatSeverity::Medium => "medium",
            ThreatSeverity::High => "high",
            ThreatSeverity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for ThreatSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
