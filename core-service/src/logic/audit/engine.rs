//! Audit Engine
//!
//! Một stage cho mỗi check trong catalogue; `AuditRun` chung được cập nhật
//! sau mỗi check qua observer. Mỗi run có scorer riêng từ factory, nên
//! run bị cancel hay bị thay thế không làm lệch chuỗi điểm của run sau.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::scorer::{AuditScorer, SimulatedAuditScorer};
use super::types::{AuditCheckResult, AuditCheckSpec, AuditRun};
use crate::logic::config::{EngineConfig, StageTiming};
use crate::logic::error::{EngineError, EngineResult};
use crate::logic::pipeline::{
    PipelineObserver, PipelineRun, PipelineRunner, Progress, RunHandle, RunOutcome, RunState,
    StageSpec,
};

type SharedScorer = Arc<Mutex<Box<dyn AuditScorer>>>;
type ScorerFactory = Arc<dyn Fn() -> Box<dyn AuditScorer> + Send + Sync>;

// ============================================================================
// OBSERVER
// ============================================================================

struct AuditObserver {
    run: Arc<RwLock<AuditRun>>,
}

impl PipelineObserver<AuditCheckResult> for AuditObserver {
    fn on_progress(&mut self, progress: &Progress, latest: &AuditCheckResult) {
        log::debug!(
            "Audit check '{}' -> {} ({}), {:.0}%",
            latest.check_name, latest.status, latest.score, progress.percent
        );
        self.run.write().record(progress, latest);
    }

    fn on_complete(&mut self, _results: &[AuditCheckResult]) {
        let mut run = self.run.write();
        run.finish(RunState::Completed);
        log::info!(
            "Audit {} completed: score {:?} ({:?})",
            run.id, run.rounded_score(), run.posture()
        );
    }

    fn on_cancelled(&mut self, completed: &[AuditCheckResult]) {
        self.run.write().finish(RunState::Cancelled);
        log::info!("Audit cancelled after {} checks", completed.len());
    }
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct AuditEngine {
    catalogue: Vec<AuditCheckSpec>,
    scorers: ScorerFactory,
    timing: StageTiming,
    seed: Option<u64>,
}

impl AuditEngine {
    /// `scorers` builds a fresh scorer for every planned run
    pub fn new<F, S>(catalogue: Vec<AuditCheckSpec>, scorers: F, timing: StageTiming) -> EngineResult<Self>
    where
        F: Fn() -> S + Send + Sync + 'static,
        S: AuditScorer + 'static,
    {
        if catalogue.is_empty() {
            return Err(EngineError::invalid_config("audit catalogue is empty"));
        }
        timing.validate()?;
        Ok(Self {
            catalogue,
            scorers: Arc::new(move || Box::new(scorers()) as Box<dyn AuditScorer>),
            timing,
            seed: None,
        })
    }

    /// Catalogue, timing and simulated scorer from config
    pub fn from_config(config: &EngineConfig) -> EngineResult<Self> {
        let seed = config.seed;
        let mut engine = Self::new(
            config.audit_checks.clone(),
            move || SimulatedAuditScorer::with_seed(seed),
            config.timing,
        )?;
        engine.seed = config.seed;
        Ok(engine)
    }

    pub fn catalogue(&self) -> &[AuditCheckSpec] {
        &self.catalogue
    }

    /// Build the pipeline without starting it.
    ///
    /// Callers drive it with `step()`/`drive()` or hand it to `PipelineRunner`.
    pub fn plan(&self) -> EngineResult<(PipelineRun<AuditCheckResult>, Arc<RwLock<AuditRun>>)> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let run_scorer: SharedScorer = Arc::new(Mutex::new((self.scorers)()));
        let stages: Vec<StageSpec<AuditCheckResult>> = self
            .catalogue
            .iter()
            .map(|spec| {
                let spec = spec.clone();
                let scorer = Arc::clone(&run_scorer);
                let delay = self.timing.sample(&mut rng);
                StageSpec::new(spec.name.clone(), move || run_check(spec, scorer, delay))
            })
            .collect();

        // Placeholder id, replaced once the pipeline exists
        let shared = Arc::new(RwLock::new(AuditRun::new(uuid::Uuid::nil(), &self.catalogue)));
        let pipeline = PipelineRun::new(
            "audit",
            stages,
            AuditObserver {
                run: Arc::clone(&shared),
            },
        )?;
        shared.write().id = pipeline.id();

        log::info!("Audit {} planned with {} checks", pipeline.id(), self.catalogue.len());
        Ok((pipeline, shared))
    }

    /// Plan and spawn on the tokio runtime
    pub fn start(&self) -> EngineResult<AuditHandle> {
        let (pipeline, run) = self.plan()?;
        let handle = PipelineRunner::spawn(pipeline);
        Ok(AuditHandle { run, handle })
    }
}

async fn run_check(spec: AuditCheckSpec, scorer: SharedScorer, delay: Duration) -> AuditCheckResult {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    let verdict = scorer.lock().evaluate(&spec);
    AuditCheckResult::from_verdict(&spec, verdict)
}

// ============================================================================
// HANDLE
// ============================================================================

/// A running audit
pub struct AuditHandle {
    run: Arc<RwLock<AuditRun>>,
    handle: RunHandle<AuditCheckResult>,
}

impl AuditHandle {
    pub fn id(&self) -> uuid::Uuid {
        self.handle.id()
    }

    /// Copy of the run as of now
    pub fn snapshot(&self) -> AuditRun {
        self.run.read().clone()
    }

    pub fn cancel(&self) {
        self.handle.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the run to end. `Cancelled` if it was cancelled.
    pub async fn wait(self) -> EngineResult<AuditRun> {
        let outcome = self.handle.wait().await?;
        let run = self.run.read().clone();
        match outcome {
            RunOutcome::Completed(_) => Ok(run),
            RunOutcome::Cancelled(_) => Err(EngineError::Cancelled(run.id)),
        }
    }
}
