//! Pipeline Runner
//!
//! Chạy các stage tuần tự, báo progress sau mỗi stage, dừng khi bị cancel.
//! `PipelineRun::step` advances one stage; `PipelineRunner::spawn` drives a
//! run to the end on a tokio task.

use std::collections::VecDeque;

use tokio::task::JoinHandle;
use uuid::Uuid;

use super::types::{
    CancelToken, FnObserver, PipelineObserver, Progress, RunOutcome, RunState, StageSpec,
    StepOutcome,
};
use crate::logic::error::{EngineError, EngineResult};

// ============================================================================
// RUN
// ============================================================================

pub struct PipelineRun<T> {
    id: Uuid,
    name: String,
    stages: VecDeque<StageSpec<T>>,
    results: Vec<T>,
    total_stages: usize,
    total_weight: u32,
    completed_weight: u32,
    last_stage: Option<String>,
    state: RunState,
    cancel: CancelToken,
    observer: Box<dyn PipelineObserver<T>>,
}

impl<T: Send + 'static> PipelineRun<T> {
    /// Validate stages and build a pending run.
    ///
    /// Empty stage lists and zero weights are rejected.
    pub fn new<O>(name: impl Into<String>, stages: Vec<StageSpec<T>>, observer: O) -> EngineResult<Self>
    where
        O: PipelineObserver<T> + 'static,
    {
        let name = name.into();
        if stages.is_empty() {
            return Err(EngineError::invalid_config(format!(
                "pipeline '{}' has no stages",
                name
            )));
        }
        if let Some(stage) = stages.iter().find(|s| s.weight == 0) {
            return Err(EngineError::invalid_config(format!(
                "stage '{}' has zero weight",
                stage.name
            )));
        }

        let total_weight = stages
            .iter()
            .try_fold(0u32, |acc, s| acc.checked_add(s.weight))
            .ok_or_else(|| EngineError::invalid_config("total stage weight overflows"))?;

        Ok(Self {
            id: Uuid::new_v4(),
            name,
            total_stages: stages.len(),
            stages: stages.into(),
            results: Vec::new(),
            total_weight,
            completed_weight: 0,
            last_stage: None,
            state: RunState::Pending,
            cancel: CancelToken::new(),
            observer: Box::new(observer),
        })
    }

    /// Share an externally owned cancel token
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn results(&self) -> &[T] {
        &self.results
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn progress(&self) -> Progress {
        Progress::new(
            self.results.len(),
            self.total_stages,
            self.completed_weight,
            self.total_weight,
            self.last_stage.clone(),
        )
    }

    /// Execute the next stage.
    ///
    /// Cancellation is checked before the stage starts and again after it
    /// finishes; a result that lands after cancellation is dropped.
    pub async fn step(&mut self) -> StepOutcome {
        match self.state {
            RunState::Completed => return StepOutcome::Completed,
            RunState::Cancelled => return StepOutcome::Cancelled,
            RunState::Pending | RunState::Running => {}
        }

        if self.cancel.is_cancelled() {
            return self.finish_cancelled();
        }

        let Some(stage) = self.stages.pop_front() else {
            return self.finish_completed();
        };
        self.state = RunState::Running;

        let (stage_name, weight, execute) = stage.into_parts();
        log::debug!("[{}] stage '{}' started", self.name, stage_name);
        let result = execute().await;

        if self.cancel.is_cancelled() {
            log::debug!("[{}] stage '{}' finished after cancel, result dropped", self.name, stage_name);
            return self.finish_cancelled();
        }

        self.completed_weight += weight;
        self.last_stage = Some(stage_name);
        self.results.push(result);

        let progress = self.progress();
        if let Some(latest) = self.results.last() {
            self.observer.on_progress(&progress, latest);
        }

        if self.stages.is_empty() {
            self.finish_completed()
        } else {
            StepOutcome::Advanced(progress)
        }
    }

    /// Step until the run completes or is cancelled
    pub async fn drive(mut self) -> RunOutcome<T> {
        loop {
            match self.step().await {
                StepOutcome::Advanced(_) => continue,
                StepOutcome::Completed => return RunOutcome::Completed(self.results),
                StepOutcome::Cancelled => return RunOutcome::Cancelled(self.results),
            }
        }
    }

    fn finish_completed(&mut self) -> StepOutcome {
        self.state = RunState::Completed;
        self.observer.on_complete(&self.results);
        log::info!(
            "[{}] run {} completed ({} stages)",
            self.name, self.id, self.results.len()
        );
        StepOutcome::Completed
    }

    fn finish_cancelled(&mut self) -> StepOutcome {
        self.state = RunState::Cancelled;
        self.stages.clear();
        self.observer.on_cancelled(&self.results);
        log::info!(
            "[{}] run {} cancelled after {}/{} stages",
            self.name, self.id, self.results.len(), self.total_stages
        );
        StepOutcome::Cancelled
    }
}

// ============================================================================
// BACKGROUND EXECUTION
// ============================================================================

/// Handle to a run executing on a tokio task
pub struct RunHandle<T> {
    id: Uuid,
    cancel: CancelToken,
    task: JoinHandle<RunOutcome<T>>,
}

impl<T> RunHandle<T> {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn wait(self) -> EngineResult<RunOutcome<T>> {
        self.task
            .await
            .map_err(|e| EngineError::RunAborted(e.to_string()))
    }
}

pub struct PipelineRunner;

impl PipelineRunner {
    /// Drive `run` on a new tokio task. Must be called inside a runtime.
    pub fn spawn<T: Send + 'static>(run: PipelineRun<T>) -> RunHandle<T> {
        let id = run.id();
        let cancel = run.cancel_token();
        let task = tokio::spawn(run.drive());
        RunHandle { id, cancel, task }
    }

    /// Build and spawn a run with closure callbacks
    pub fn run<T, P, C>(
        name: impl Into<String>,
        stages: Vec<StageSpec<T>>,
        on_progress: P,
        on_complete: C,
    ) -> EngineResult<RunHandle<T>>
    where
        T: Send + 'static,
        P: FnMut(&Progress, &T) + Send + 'static,
        C: FnOnce(&[T]) + Send + 'static,
    {
        let run = PipelineRun::new(name, stages, FnObserver::new(on_progress, on_complete))?;
        Ok(Self::spawn(run))
    }
}
