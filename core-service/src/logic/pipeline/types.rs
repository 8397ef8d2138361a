//! Pipeline Types
//!
//! Stage spec, progress, outcome, cancel token, observer trait.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

// ============================================================================
// STAGE
// ============================================================================

pub type StageFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

type StageFn<T> = Box<dyn FnOnce() -> StageFuture<T> + Send + 'static>;

/// One named unit of work. `weight` sets its share of the progress bar.
pub struct StageSpec<T> {
    pub name: String,
    pub weight: u32,
    execute: StageFn<T>,
}

impl<T> StageSpec<T> {
    pub fn new<F, Fut>(name: impl Into<String>, execute: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        Self {
            name: name.into(),
            weight: 1,
            execute: Box::new(move || Box::pin(execute()) as StageFuture<T>),
        }
    }

    /// Stage that returns `value` immediately
    pub fn ready(name: impl Into<String>, value: T) -> Self
    where
        T: Send + 'static,
    {
        Self::new(name, move || async move { value })
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    pub(crate) fn into_parts(self) -> (String, u32, StageFn<T>) {
        (self.name, self.weight, self.execute)
    }
}

impl<T> std::fmt::Debug for StageSpec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageSpec")
            .field("name", &self.name)
            .field("weight", &self.weight)
            .finish()
    }
}

// ============================================================================
// PROGRESS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub completed_stages: usize,
    pub total_stages: usize,
    pub completed_weight: u32,
    pub total_weight: u32,
    /// 100 * completed_weight / total_weight
    pub percent: f64,
    /// Last stage that finished, if any
    pub stage: Option<String>,
}

impl Progress {
    pub(crate) fn new(
        completed_stages: usize,
        total_stages: usize,
        completed_weight: u32,
        total_weight: u32,
        stage: Option<String>,
    ) -> Self {
        let percent = if total_weight == 0 {
            0.0
        } else if completed_weight >= total_weight {
            100.0
        } else {
            f64::from(completed_weight) * 100.0 / f64::from(total_weight)
        };
        Self {
            completed_stages,
            total_stages,
            completed_weight,
            total_weight,
            percent,
            stage,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.total_weight > 0 && self.completed_weight >= self.total_weight
    }

    pub fn percent_rounded(&self) -> u8 {
        self.percent.round().clamp(0.0, 100.0) as u8
    }
}

// ============================================================================
// RUN STATE / OUTCOME
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Pending,
    Running,
    Completed,
    Cancelled,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Pending => "pending",
            RunState::Running => "running",
            RunState::Completed => "completed",
            RunState::Cancelled => "cancelled",
        }
    }
}

/// Result of a single `step()`
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// A stage finished and more remain
    Advanced(Progress),
    /// The last stage finished (or the run had already completed)
    Completed,
    /// The run stopped on cancellation
    Cancelled,
}

/// Terminal result of a whole run
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome<T> {
    Completed(Vec<T>),
    /// Results recorded before the cancellation point
    Cancelled(Vec<T>),
}

impl<T> RunOutcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunOutcome::Cancelled(_))
    }

    pub fn results(&self) -> &[T] {
        match self {
            RunOutcome::Completed(r) | RunOutcome::Cancelled(r) => r,
        }
    }
}

// ============================================================================
// CANCEL TOKEN
// ============================================================================

/// Shared stop flag. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ============================================================================
// OBSERVER
// ============================================================================

/// Callbacks for one run. Called sequentially from the task driving the run.
pub trait PipelineObserver<T>: Send {
    /// After each stage completes, with the stage's result
    fn on_progress(&mut self, progress: &Progress, latest: &T);

    /// Once, after the last stage of a normal run. Never after cancellation.
    fn on_complete(&mut self, results: &[T]);

    /// Once, when the run stops on cancellation
    fn on_cancelled(&mut self, _completed: &[T]) {}
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl<T> PipelineObserver<T> for NoopObserver {
    fn on_progress(&mut self, _progress: &Progress, _latest: &T) {}
    fn on_complete(&mut self, _results: &[T]) {}
}

/// Closure adapter: `FnObserver::new(on_progress, on_complete)`
pub struct FnObserver<P, C> {
    on_progress: P,
    on_complete: Option<C>,
}

impl<P, C> FnObserver<P, C> {
    pub fn new(on_progress: P, on_complete: C) -> Self {
        Self {
            on_progress,
            on_complete: Some(on_complete),
        }
    }
}

impl<T, P, C> PipelineObserver<T> for FnObserver<P, C>
where
    P: FnMut(&Progress, &T) + Send,
    C: FnOnce(&[T]) + Send,
{
    fn on_progress(&mut self, progress: &Progress, latest: &T) {
        (self.on_progress)(progress, latest);
    }

    fn on_complete(&mut self, results: &[T]) {
        if let Some(done) = self.on_complete.take() {
            done(results);
        }
    }
}
