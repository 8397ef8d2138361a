//! Engine Errors
//!
//! Mọi lỗi của engine đều là lỗi đồng bộ, caller tự xử lý được.
//! A `fail` audit/scan classification is data, never one of these.

use thiserror::Error;
use uuid::Uuid;

use super::incident::IncidentStatus;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Unknown incident id
    #[error("incident {0} not found")]
    NotFound(Uuid),

    /// Status ordering violated
    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: IncidentStatus,
        to: IncidentStatus,
    },

    /// Analysis requested with no evidence
    #[error("insufficient evidence: at least one evidence reference is required")]
    InsufficientEvidence,

    /// Malformed scan/audit/engine parameters
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Pipeline stopped before completion
    #[error("pipeline run {0} was cancelled")]
    Cancelled(Uuid),

    /// Pipeline task died (stage panicked or runtime shut down)
    #[error("pipeline run aborted: {0}")]
    RunAborted(String),

    /// Config file could not be read
    #[error("config io error: {0}")]
    ConfigIo(String),

    /// Config file is not valid JSON for `EngineConfig`
    #[error("config parse error: {0}")]
    ConfigParse(String),
}

impl EngineError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Stable machine-readable code (used by the HTTP layer)
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::InsufficientEvidence => "insufficient_evidence",
            Self::InvalidConfiguration(_) => "invalid_configuration",
            Self::Cancelled(_) => "cancelled",
            Self::RunAborted(_) => "run_aborted",
            Self::ConfigIo(_) => "config_io",
            Self::ConfigParse(_) => "config_parse",
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::ConfigIo(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::ConfigParse(err.to_string())
    }
}
