//! Scan Engine
//!
//! Chia host list thành các batch kích thước không đều, mỗi batch là một
//! weighted stage. Device records gom riêng, chỉ publish khi scan hoàn tất.
//! Mỗi run có prober riêng từ factory.

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::classifier::{PortExposureClassifier, RiskClassifier};
use super::config::{ScanConfig, ScanPlan};
use super::prober::{NetworkProber, SimulatedProber};
use super::types::{NetworkScanResult, RiskLevel, ScanBatchReport, ScanRun};
use crate::logic::config::{EngineConfig, StageTiming};
use crate::logic::error::{EngineError, EngineResult};
use crate::logic::pipeline::{
    PipelineObserver, PipelineRun, PipelineRunner, Progress, RunHandle, RunOutcome, StageSpec,
};

type SharedProber = Arc<Mutex<Box<dyn NetworkProber>>>;
type ProberFactory = Arc<dyn Fn() -> Box<dyn NetworkProber> + Send + Sync>;
type Pending = Arc<Mutex<Vec<NetworkScanResult>>>;

pub const EXPOSURE_REVIEW_STAGE: &str = "service exposure review";

// ============================================================================
// OBSERVER
// ============================================================================

struct ScanObserver {
    run: Arc<RwLock<ScanRun>>,
    pending: Pending,
}

impl PipelineObserver<ScanBatchReport> for ScanObserver {
    fn on_progress(&mut self, progress: &Progress, latest: &ScanBatchReport) {
        log::debug!(
            "Scan stage '{}': {}/{} responding, {:.1}%",
            latest.stage, latest.hosts_responding, latest.hosts_probed, progress.percent
        );
        self.run.write().record(progress, latest);
    }

    fn on_complete(&mut self, _results: &[ScanBatchReport]) {
        let devices = std::mem::take(&mut *self.pending.lock());
        let mut run = self.run.write();
        run.complete(devices);
        let summary = run.summary();
        log::info!(
            "Scan {} completed: {} devices ({} high risk)",
            run.id, summary.devices, summary.high
        );
    }

    fn on_cancelled(&mut self, completed: &[ScanBatchReport]) {
        self.pending.lock().clear();
        self.run.write().cancel();
        log::info!("Scan cancelled after {} stages", completed.len());
    }
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct ScanEngine {
    probers: ProberFactory,
    classifier: Arc<dyn RiskClassifier>,
    timing: StageTiming,
    seed: Option<u64>,
}

impl ScanEngine {
    /// `probers` builds a fresh prober for every planned run
    pub fn new<F, P, C>(probers: F, classifier: C, timing: StageTiming) -> EngineResult<Self>
    where
        F: Fn() -> P + Send + Sync + 'static,
        P: NetworkProber + 'static,
        C: RiskClassifier + 'static,
    {
        timing.validate()?;
        Ok(Self {
            probers: Arc::new(move || Box::new(probers()) as Box<dyn NetworkProber>),
            classifier: Arc::new(classifier),
            timing,
            seed: None,
        })
    }

    pub fn from_config(config: &EngineConfig) -> EngineResult<Self> {
        let seed = config.seed;
        let mut engine = Self::new(
            move || SimulatedProber::with_seed(seed),
            PortExposureClassifier,
            config.timing,
        )?;
        engine.seed = config.seed;
        Ok(engine)
    }

    /// Validate `config` and build the pipeline without starting it
    pub fn plan(&self, config: ScanConfig) -> EngineResult<(PipelineRun<ScanBatchReport>, Arc<RwLock<ScanRun>>)> {
        let ScanPlan { scan_type, hosts, ports } = config.validate()?;
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let ports = Arc::new(ports);
        let prober: SharedProber = Arc::new(Mutex::new((self.probers)()));
        let pending: Pending = Arc::new(Mutex::new(Vec::new()));
        let batches = split_batches(&hosts, scan_type.target_batches(), &mut rng);

        let mut stages: Vec<StageSpec<ScanBatchReport>> = batches
            .into_iter()
            .enumerate()
            .map(|(i, batch)| {
                let name = format!("probe batch {}", i + 1);
                let weight = batch.len() as u32;
                let job = BatchJob {
                    name: name.clone(),
                    hosts: batch,
                    ports: Arc::clone(&ports),
                    prober: Arc::clone(&prober),
                    classifier: Arc::clone(&self.classifier),
                    pending: Arc::clone(&pending),
                    delay: self.timing.sample(&mut rng),
                };
                StageSpec::new(name, move || job.run()).with_weight(weight)
            })
            .collect();

        if scan_type.reviews_exposure() {
            let pending = Arc::clone(&pending);
            let delay = self.timing.sample(&mut rng);
            let weight = (hosts.len() / 4).max(1) as u32;
            stages.push(
                StageSpec::new(EXPOSURE_REVIEW_STAGE, move || review_exposure(pending, delay))
                    .with_weight(weight),
            );
        }

        let initial = Progress::new(0, stages.len(), 0, stages.iter().map(|s| s.weight).sum(), None);
        let shared = Arc::new(RwLock::new(ScanRun::new(config, hosts.len(), ports.len(), initial)));
        let pipeline = PipelineRun::new(
            "scan",
            stages,
            ScanObserver {
                run: Arc::clone(&shared),
                pending,
            },
        )?;
        shared.write().id = pipeline.id();

        log::info!(
            "Scan {} planned: {} scan, {} hosts, {} ports",
            pipeline.id(), scan_type, hosts.len(), ports.len()
        );
        Ok((pipeline, shared))
    }

    pub fn start(&self, config: ScanConfig) -> EngineResult<ScanHandle> {
        let (pipeline, run) = self.plan(config)?;
        let handle = PipelineRunner::spawn(pipeline);
        Ok(ScanHandle { run, handle })
    }
}

/// Split hosts into about `target` batches of irregular size
fn split_batches<R: Rng>(hosts: &[Ipv4Addr], target: usize, rng: &mut R) -> Vec<Vec<Ipv4Addr>> {
    let target = target.clamp(1, hosts.len().max(1));
    let avg = (hosts.len() + target - 1) / target;
    let (lo, hi) = ((avg / 2).max(1), (avg * 3 / 2).max(1));

    let mut batches = Vec::new();
    let mut rest = hosts;
    while !rest.is_empty() {
        let size = rng.gen_range(lo..=hi).min(rest.len());
        let (head, tail) = rest.split_at(size);
        batches.push(head.to_vec());
        rest = tail;
    }
    batches
}

struct BatchJob {
    name: String,
    hosts: Vec<Ipv4Addr>,
    ports: Arc<Vec<u16>>,
    prober: SharedProber,
    classifier: Arc<dyn RiskClassifier>,
    pending: Pending,
    delay: Duration,
}

impl BatchJob {
    async fn run(self) -> ScanBatchReport {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let mut found = Vec::new();
        {
            let mut prober = self.prober.lock();
            for &address in &self.hosts {
                if let Some(report) = prober.probe(address, &self.ports) {
                    let risk = self.classifier.classify(report.role, report.reachability, &report.open_ports);
                    found.push(NetworkScanResult::new(
                        address,
                        report.role.label(),
                        report.reachability,
                        report.open_ports,
                        risk,
                    ));
                }
            }
        }

        let report = ScanBatchReport {
            stage: self.name,
            hosts_probed: self.hosts.len(),
            hosts_responding: found.iter().filter(|d| d.is_online()).count(),
            flagged: found.iter().filter(|d| d.risk_level() == RiskLevel::High).count(),
        };
        self.pending.lock().extend(found);
        report
    }
}

async fn review_exposure(pending: Pending, delay: Duration) -> ScanBatchReport {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    let devices = pending.lock();
    ScanBatchReport {
        stage: EXPOSURE_REVIEW_STAGE.to_string(),
        hosts_probed: devices.len(),
        hosts_responding: devices.iter().filter(|d| d.is_online()).count(),
        flagged: devices.iter().filter(|d| d.risk_level() >= RiskLevel::Medium).count(),
    }
}

// ============================================================================
// HANDLE
// ============================================================================

pub struct ScanHandle {
    run: Arc<RwLock<ScanRun>>,
    handle: RunHandle<ScanBatchReport>,
}

impl ScanHandle {
    pub fn id(&self) -> uuid::Uuid {
        self.handle.id()
    }

    pub fn snapshot(&self) -> ScanRun {
        self.run.read().clone()
    }

    pub fn cancel(&self) {
        self.handle.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the scan to end. `Cancelled` if it was cancelled.
    pub async fn wait(self) -> EngineResult<ScanRun> {
        let outcome = self.handle.wait().await?;
        let run = self.run.read().clone();
        match outcome {
            RunOutcome::Completed(_) => Ok(run),
            RunOutcome::Cancelled(_) => Err(EngineError::Cancelled(run.id)),
        }
    }
}
