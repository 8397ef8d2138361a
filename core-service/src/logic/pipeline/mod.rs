//! Staged Pipeline Module
//!
//! Chạy một chuỗi stage có trọng số, báo progress và hỗ trợ cancel.
//! Dùng chung cho audit và network scan.
//!
//! ## Structure
//! - `types`: StageSpec, Progress, RunState, outcomes, CancelToken, observer trait
//! - `runner`: PipelineRun (step/drive), PipelineRunner (spawn), RunHandle

pub mod types;
pub mod runner;


pub use types::{
    CancelToken,
    FnObserver,
    NoopObserver,
    PipelineObserver,
    Progress,
    RunOutcome,
    RunState,
    StageFuture,
    StageSpec,
    StepOutcome,
};

pub use runner::{PipelineRun, PipelineRunner, RunHandle};
