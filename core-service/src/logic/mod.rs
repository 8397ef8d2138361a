//! Logic Module - Incident & Assessment Engine
//!
//! Chứa các engine: Incident Store, Threat Analysis, Pipeline Runner,
//! Security Audit, Network Scan.
//!
//! ## Layout (leaf-first)
//! - `error` - EngineError taxonomy
//! - `config` - EngineConfig (vocabulary, audit catalogue, timing, seed)
//! - `incident/` - Incident record store + lifecycle
//! - `threat/` - Threat scoring and analysis attachment
//! - `pipeline/` - Staged pipeline runner with progress + cancellation
//! - `audit/` - Security audit engine
//! - `scan/` - Network scan engine
//! - `engine` - SecurityEngine facade with active audit/scan slots

pub mod error;
pub mod config;

// Engines
pub mod incident;
pub mod threat;
pub mod pipeline;
pub mod audit;
pub mod scan;

// Facade
pub mod engine;

pub use config::{EngineConfig, StageTiming};
pub use engine::SecurityEngine;
pub use error::{EngineError, EngineResult};
