//! Threat Scoring Rules & Vocabulary
//!
//! Định nghĩa các threshold và vocabulary cho threat analysis.
//! KHÔNG chứa logic scoring - chỉ constants và config.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::logic::error::{EngineError, EngineResult};
use crate::logic::incident::{IncidentCategory, Priority};

// ============================================================================
// THRESHOLDS
// ============================================================================

/// At or above this level an escalation recommendation is prepended
pub const ESCALATION_THRESHOLD: u8 = 80;

/// Recommendation prepended for critical findings
pub const ESCALATION_RECOMMENDATION: &str = "Escalate to the incident response lead immediately";

// ============================================================================
// HEURISTIC WEIGHTS
// ============================================================================

/// Points added per evidence item
pub const EVIDENCE_WEIGHT: i64 = 6;

/// Cap on evidence contribution
pub const EVIDENCE_CAP: i64 = 24;

/// Points added per affected system
pub const AFFECTED_SYSTEM_WEIGHT: i64 = 4;

/// Points added when an evidence file looks like it matters for the category
pub const SIGNAL_WEIGHT: i64 = 12;

/// Base confidence before evidence is counted
pub const BASE_CONFIDENCE: i64 = 45;

/// Confidence gained per evidence item
pub const CONFIDENCE_PER_EVIDENCE: i64 = 10;

/// Confidence ceiling for heuristic scoring
pub const MAX_HEURISTIC_CONFIDENCE: i64 = 95;

/// Base threat level by reported priority
pub fn priority_base(priority: Priority) -> i64 {
    match priority {
        Priority::Critical => 60,
        Priority::High => 45,
        Priority::Medium => 30,
        Priority::Low => 15,
    }
}

/// File extensions that carry weight for a category
pub fn category_signals(category: IncidentCategory) -> &'static [&'static str] {
    match category {
        IncidentCategory::Phishing => &["eml", "msg", "html", "htm", "url"],
        IncidentCategory::Malware => &["exe", "dll", "js", "vbs", "ps1", "docm", "xlsm", "bin"],
        IncidentCategory::Fraud => &["csv", "xlsx", "pdf", "ofx"],
        IncidentCategory::Espionage => &["pcap", "gpx", "kml", "log"],
        IncidentCategory::Opsec => &["jpg", "jpeg", "png", "docx", "pdf"],
        IncidentCategory::Other => &[],
    }
}

// ============================================================================
// VOCABULARY (configuration input)
// ============================================================================

/// Closed set of labels and actions for one category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryVocabulary {
    pub indicators: Vec<String>,
    pub recommendations: Vec<String>,
}

impl CategoryVocabulary {
    fn of(indicators: &[&str], recommendations: &[&str]) -> Self {
        Self {
            indicators: indicators.iter().map(|s| s.to_string()).collect(),
            recommendations: recommendations.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn contains_indicator(&self, label: &str) -> bool {
        self.indicators.iter().any(|i| i.eq_ignore_ascii_case(label))
    }
}

/// Indicator/recommendation vocabulary per incident category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatVocabulary {
    pub categories: HashMap<IncidentCategory, CategoryVocabulary>,
}

impl ThreatVocabulary {
    pub fn for_category(&self, category: IncidentCategory) -> EngineResult<&CategoryVocabulary> {
        self.categories.get(&category).ok_or_else(|| {
            EngineError::invalid_config(format!("no vocabulary configured for category '{}'", category))
        })
    }

    /// Every category needs at least one indicator and one recommendation
    pub fn validate(&self) -> EngineResult<()> {
        for category in IncidentCategory::ALL {
            let vocab = self.for_category(category)?;
            if vocab.indicators.iter().all(|i| i.trim().is_empty()) {
                return Err(EngineError::invalid_config(format!(
                    "vocabulary for '{}' has no indicators",
                    category
                )));
            }
            if vocab.recommendations.iter().all(|r| r.trim().is_empty()) {
                return Err(EngineError::invalid_config(format!(
                    "vocabulary for '{}' has no recommendations",
                    category
                )));
            }
        }
        Ok(())
    }
}

impl Default for ThreatVocabulary {
    fn default() -> Self {
        let mut categories = HashMap::new();
        categories.insert(
            IncidentCategory::Fraud,
            CategoryVocabulary::of(
                &[
                    "Anomalous transaction pattern",
                    "Account takeover attempt",
                    "Identity mismatch",
                    "Invoice manipulation",
                ],
                &[
                    "Freeze affected accounts pending review",
                    "Verify payment requests through a second channel",
                    "Notify the finance control team",
                ],
            ),
        );
        categories.insert(
            IncidentCategory::Malware,
            CategoryVocabulary::of(
                &[
                    "Malicious executable signature",
                    "Suspicious persistence mechanism",
                    "Command-and-control beaconing",
                    "Ransomware behavior",
                ],
                &[
                    "Isolate affected hosts from the network",
                    "Collect memory and disk images before cleanup",
                    "Restore affected systems from known-good backups",
                ],
            ),
        );
        categories.insert(
            IncidentCategory::Phishing,
            CategoryVocabulary::of(
                &[
                    "Spoofed sender",
                    "Credential harvesting",
                    "Malicious link",
                    "Lookalike domain",
                ],
                &[
                    "Block the sender domain at the mail gateway",
                    "Reset credentials for recipients who clicked",
                    "Schedule security awareness training",
                ],
            ),
        );
        categories.insert(
            IncidentCategory::Espionage,
            CategoryVocabulary::of(
                &[
                    "Location harvesting",
                    "Covert data exfiltration",
                    "Unauthorized device access",
                    "Lateral movement",
                ],
                &[
                    "Revoke access for compromised accounts",
                    "Preserve network captures for forensic review",
                    "Brief leadership on potential exposure",
                ],
            ),
        );
        categories.insert(
            IncidentCategory::Opsec,
            CategoryVocabulary::of(
                &[
                    "Sensitive data exposure",
                    "Metadata leakage",
                    "Policy violation",
                ],
                &[
                    "Remove exposed material from public channels",
                    "Strip metadata before publishing documents",
                    "Review data handling policy with the team",
                ],
            ),
        );
        categories.insert(
            IncidentCategory::Other,
            CategoryVocabulary::of(
                &["Anomalous activity", "Unverified report"],
                &[
                    "Gather additional evidence",
                    "Monitor affected systems for recurrence",
                ],
            ),
        );
        Self { categories }
    }
}

// ============================================================================
// TESTS
// ============================================================================
