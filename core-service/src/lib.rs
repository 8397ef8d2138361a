//! SecOps Core - Incident & Assessment Engine
//!
//! Library half of `secops-core`: used by the headless runner binary and by
//! `secops-server`.

pub mod constants;
pub mod logic;

pub use logic::{EngineConfig, EngineError, EngineResult, SecurityEngine, StageTiming};
