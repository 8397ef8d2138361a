use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::logic::error::{EngineError, EngineResult};
use crate::logic::pipeline::{Progress, RunState};

// ============================================================================
// CATALOGUE
// ============================================================================

/// One entry of the audit catalogue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditCheckSpec {
    pub name: String,
    /// Finding text reported with the result
    pub detail: String,
    /// Advice shown when the check does not pass
    pub remediation: String,
}

impl AuditCheckSpec {
    pub fn new(name: &str, detail: &str, remediation: &str) -> Self {
        Self {
            name: name.to_string(),
            detail: detail.to_string(),
            remediation: remediation.to_string(),
        }
    }
}

/// The eight built-in checks, in execution order
pub fn default_catalogue() -> Vec<AuditCheckSpec> {
    vec![
        AuditCheckSpec::new(
            "Password Policy Compliance",
            "Strong password requirements enforced",
            "Enforce minimum length, complexity and rotation for all accounts",
        ),
        AuditCheckSpec::new(
            "User Access Permissions",
            "3 users with excessive privileges detected",
            "Review privileged accounts and apply least privilege",
        ),
        AuditCheckSpec::new(
            "System Vulnerabilities",
            "2 critical vulnerabilities found",
            "Patch critical vulnerabilities within the remediation window",
        ),
        AuditCheckSpec::new(
            "Network Security Configuration",
            "Firewall rules properly configured",
            "Audit firewall rules and close unused inbound ports",
        ),
        AuditCheckSpec::new(
            "Data Encryption Status",
            "All sensitive data encrypted at rest",
            "Enable encryption at rest for every sensitive data store",
        ),
        AuditCheckSpec::new(
            "Backup Integrity",
            "Last backup completed successfully",
            "Run a restore test and verify backup retention",
        ),
        AuditCheckSpec::new(
            "Log Analysis",
            "No suspicious activities detected",
            "Extend log retention and alert on authentication anomalies",
        ),
        AuditCheckSpec::new(
            "Compliance Verification",
            "GDPR compliance requirements met",
            "Schedule a compliance review with the data protection officer",
        ),
    ]
}

// ============================================================================
// RESULT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Warning,
    Fail,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Pass => "pass",
            CheckStatus::Warning => "warning",
            CheckStatus::Fail => "fail",
        }
    }
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Scorer output for one check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckVerdict {
    pub status: CheckStatus,
    pub score: u8,
}

impl CheckVerdict {
    /// Score is clamped to 0-100
    pub fn new(status: CheckStatus, score: i64) -> Self {
        Self {
            status,
            score: score.clamp(0, 100) as u8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditCheckResult {
    pub check_name: String,
    pub status: CheckStatus,
    pub detail: String,
    pub score: u8,
}

impl AuditCheckResult {
    pub fn from_verdict(spec: &AuditCheckSpec, verdict: CheckVerdict) -> Self {
        Self {
            check_name: spec.name.clone(),
            status: verdict.status,
            detail: spec.detail.clone(),
            score: verdict.score,
        }
    }
}

// ============================================================================
// POSTURE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostureBand {
    Excellent,
    Good,
    Moderate,
    Poor,
}

impl PostureBand {
    /// >=90 excellent, >=75 good, >=60 moderate, else poor
    pub fn from_score(score: u8) -> Self {
        match score {
            90.. => PostureBand::Excellent,
            75..=89 => PostureBand::Good,
            60..=74 => PostureBand::Moderate,
            _ => PostureBand::Poor,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PostureBand::Excellent => "excellent",
            PostureBand::Good => "good",
            PostureBand::Moderate => "moderate",
            PostureBand::Poor => "poor",
        }
    }
}

impl std::fmt::Display for PostureBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub passed: usize,
    pub warnings: usize,
    pub failed: usize,
}

impl AuditSummary {
    pub fn total(&self) -> usize {
        self.passed + self.warnings + self.failed
    }
}

// ============================================================================
// RUN
// ============================================================================

/// State of one audit, updated after every completed check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRun {
    pub id: Uuid,
    pub state: RunState,
    pub results: Vec<AuditCheckResult>,
    pub progress: Progress,
    /// Remediation per check, catalogue order
    #[serde(skip)]
    pub(crate) remediation: Vec<(String, String)>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl AuditRun {
    pub(crate) fn new(id: Uuid, catalogue: &[AuditCheckSpec]) -> Self {
        let total = catalogue.len();
        Self {
            id,
            state: RunState::Running,
            results: Vec::with_capacity(total),
            progress: Progress::new(0, total, 0, total as u32, None),
            remediation: catalogue
                .iter()
                .map(|c| (c.name.clone(), c.remediation.clone()))
                .collect(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub(crate) fn record(&mut self, progress: &Progress, result: &AuditCheckResult) {
        self.results.push(result.clone());
        self.progress = progress.clone();
    }

    pub(crate) fn finish(&mut self, state: RunState) {
        self.state = state;
        self.finished_at = Some(Utc::now());
    }

    /// Mean of the scores recorded so far. `None` with no results.
    pub fn overall_score(&self) -> Option<f64> {
        if self.results.is_empty() {
            return None;
        }
        let sum: u32 = self.results.iter().map(|r| u32::from(r.score)).sum();
        Some(f64::from(sum) / self.results.len() as f64)
    }

    /// Rounded mean, as shown on the dashboard
    pub fn rounded_score(&self) -> Option<u8> {
        self.overall_score().map(|s| s.round() as u8)
    }

    /// Posture score of a finished run.
    ///
    /// `Ok(None)` while the run is still going; `Cancelled` for a cancelled run.
    pub fn terminal_score(&self) -> EngineResult<Option<f64>> {
        match self.state {
            RunState::Completed => Ok(self.overall_score()),
            RunState::Cancelled => Err(EngineError::Cancelled(self.id)),
            RunState::Pending | RunState::Running => Ok(None),
        }
    }

    pub fn posture(&self) -> Option<PostureBand> {
        self.rounded_score().map(PostureBand::from_score)
    }

    pub fn summary(&self) -> AuditSummary {
        let mut summary = AuditSummary::default();
        for result in &self.results {
            match result.status {
                CheckStatus::Pass => summary.passed += 1,
                CheckStatus::Warning => summary.warnings += 1,
                CheckStatus::Fail => summary.failed += 1,
            }
        }
        summary
    }

    /// Remediation advice for every warning/fail result, in catalogue order
    pub fn recommendations(&self) -> Vec<String> {
        self.results
            .iter()
            .filter(|r| r.status != CheckStatus::Pass)
            .filter_map(|r| {
                self.remediation
                    .iter()
                    .find(|(name, _)| *name == r.check_name)
                    .map(|(_, advice)| advice.clone())
            })
            .collect()
    }

    /// Serializable view with derived fields filled in
    pub fn report(&self) -> AuditReport {
        AuditReport {
            id: self.id,
            state: self.state,
            progress: self.progress.clone(),
            results: self.results.clone(),
            overall_score: self.overall_score(),
            posture: self.posture(),
            summary: self.summary(),
            recommendations: self.recommendations(),
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub id: Uuid,
    pub state: RunState,
    pub progress: Progress,
    pub results: Vec<AuditCheckResult>,
    pub overall_score: Option<f64>,
    pub posture: Option<PostureBand>,
    pub summary: AuditSummary,
    pub recommendations: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}
