//! Security Audit Module
//!
//! Chạy catalogue các audit check qua pipeline runner và tổng hợp
//! posture score (mean của các score đã hoàn thành).
//!
//! ## Structure
//! - `types`: Catalogue, check results, AuditRun, PostureBand
//! - `scorer`: AuditScorer trait + SimulatedAuditScorer
//! - `engine`: AuditEngine (plan/start), AuditHandle

pub mod types;
pub mod scorer;
pub mod engine;

#[cfg(test)]
mod tests;

pub use types::{
    default_catalogue,
    AuditCheckResult,
    AuditCheckSpec,
    AuditReport,
    AuditRun,
    AuditSummary,
    CheckStatus,
    CheckVerdict,
    PostureBand,
};

pub use scorer::{AuditScorer, SimulatedAuditScorer};
pub use engine::{AuditEngine, AuditHandle};
