//! Security Engine Facade
//!
//! Điểm vào duy nhất cho presentation layer: incident store, threat
//! analyzer, audit và scan engines, cùng *active slot* cho audit/scan
//! hiện tại. Starting a run replaces (and cancels) the previous one.
//!
//! `start_audit` / `start_scan` spawn onto the tokio runtime and must be
//! called from inside one.

use parking_lot::Mutex;
use uuid::Uuid;

use super::audit::{AuditEngine, AuditHandle, AuditRun};
use super::config::EngineConfig;
use super::error::EngineResult;
use super::incident::{
    Incident, IncidentFilter, IncidentStats, IncidentStatus, IncidentStore, NewIncident,
};
use super::scan::{ScanConfig, ScanEngine, ScanHandle, ScanRun};
use super::threat::{HeuristicScorer, ThreatAnalyzer};

pub struct SecurityEngine {
    config: EngineConfig,
    store: IncidentStore,
    analyzer: ThreatAnalyzer,
    audits: AuditEngine,
    scans: ScanEngine,
    active_audit: Mutex<Option<AuditHandle>>,
    active_scan: Mutex<Option<ScanHandle>>,
}

impl SecurityEngine {
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let analyzer = ThreatAnalyzer::new(Box::new(HeuristicScorer), config.vocabulary.clone())?;
        let audits = AuditEngine::from_config(&config)?;
        let scans = ScanEngine::from_config(&config)?;

        log::info!(
            "Security engine ready: {} audit checks, default priority {}",
            config.audit_checks.len(),
            config.default_priority
        );
        Ok(Self {
            store: IncidentStore::new(config.default_priority),
            analyzer,
            audits,
            scans,
            active_audit: Mutex::new(None),
            active_scan: Mutex::new(None),
            config,
        })
    }

    /// Engine built from `EngineConfig::from_env()`
    pub fn from_env() -> EngineResult<Self> {
        Self::new(EngineConfig::from_env()?)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &IncidentStore {
        &self.store
    }

    pub fn analyzer(&self) -> &ThreatAnalyzer {
        &self.analyzer
    }

    // ========================================================================
    // INCIDENTS
    // ========================================================================

    /// Create an incident. Evidence given at creation counts as a submission
    /// and is analyzed right away.
    pub fn create_incident(&self, req: NewIncident) -> EngineResult<Incident> {
        let incident = self.store.create(req)?;
        if incident.evidence_refs.is_empty() {
            return Ok(incident);
        }
        self.analyzer.reanalyze(&self.store, incident.id)
    }

    pub fn get_incident(&self, id: Uuid) -> EngineResult<Incident> {
        self.store.get(id)
    }

    pub fn list_incidents(&self, filter: &IncidentFilter) -> Vec<Incident> {
        self.store.list(filter)
    }

    pub fn incident_stats(&self) -> IncidentStats {
        self.store.stats()
    }

    pub fn submit_evidence(&self, id: Uuid, refs: Vec<String>, actor: &str) -> EngineResult<Incident> {
        self.analyzer.submit_evidence(&self.store, id, refs, actor)
    }

    pub fn transition(&self, id: Uuid, status: IncidentStatus, actor: &str) -> EngineResult<Incident> {
        self.store.transition_as(id, status, actor)
    }

    pub fn assign(&self, id: Uuid, analyst: &str) -> EngineResult<Incident> {
        self.store.assign(id, analyst)
    }

    // ========================================================================
    // AUDITS
    // ========================================================================

    /// Start a new audit in the active slot, cancelling any previous one
    pub fn start_audit(&self) -> EngineResult<AuditRun> {
        let handle = self.audits.start()?;
        let snapshot = handle.snapshot();
        if let Some(previous) = self.active_audit.lock().replace(handle) {
            if !previous.is_finished() {
                log::info!("Audit {} replaced by {}", previous.id(), snapshot.id);
            }
            previous.cancel();
        }
        Ok(snapshot)
    }

    pub fn current_audit(&self) -> Option<AuditRun> {
        self.active_audit.lock().as_ref().map(AuditHandle::snapshot)
    }

    /// Request cancellation of the active audit; returns its snapshot
    pub fn cancel_audit(&self) -> Option<AuditRun> {
        let slot = self.active_audit.lock();
        slot.as_ref().map(|handle| {
            handle.cancel();
            handle.snapshot()
        })
    }

    /// Take the active audit out of the slot and wait for it to finish
    pub async fn finish_audit(&self) -> Option<EngineResult<AuditRun>> {
        let handle = self.active_audit.lock().take()?;
        Some(handle.wait().await)
    }

    // ========================================================================
    // SCANS
    // ========================================================================

    /// Start a new scan in the active slot, cancelling any previous one.
    /// Invalid configuration leaves the current slot untouched.
    pub fn start_scan(&self, config: ScanConfig) -> EngineResult<ScanRun> {
        let handle = self.scans.start(config)?;
        let snapshot = handle.snapshot();
        if let Some(previous) = self.active_scan.lock().replace(handle) {
            if !previous.is_finished() {
                log::info!("Scan {} replaced by {}", previous.id(), snapshot.id);
            }
            previous.cancel();
        }
        Ok(snapshot)
    }

    pub fn current_scan(&self) -> Option<ScanRun> {
        self.active_scan.lock().as_ref().map(ScanHandle::snapshot)
    }

    pub fn cancel_scan(&self) -> Option<ScanRun> {
        let slot = self.active_scan.lock();
        slot.as_ref().map(|handle| {
            handle.cancel();
            handle.snapshot()
        })
    }

    pub async fn finish_scan(&self) -> Option<EngineResult<ScanRun>> {
        let handle = self.active_scan.lock().take()?;
        Some(handle.wait().await)
    }

    /// Id of the run in each slot, for logging
    pub fn active_runs(&self) -> (Option<Uuid>, Option<Uuid>) {
        (
            self.active_audit.lock().as_ref().map(AuditHandle::id),
            self.active_scan.lock().as_ref().map(ScanHandle::id),
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================
