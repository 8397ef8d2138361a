//! Threat Module
//!
//! Phân tích evidence của incident thành `ThreatAnalysis`
//! (threat level, confidence, indicators, recommendations).
//!
//! ## Structure
//! - `types`: Core types (ThreatAnalysis, Assessment, ThreatSeverity)
//! - `context`: Context information for scoring
//! - `rules`: Weights, thresholds and the indicator vocabulary
//! - `classifier`: Scorer trait, built-in scorers, `analyze`
//! - `analyzer`: Attaches analyses to incidents on evidence submission
//!
//! ## Usage
//! ```ignore
//! use crate::logic::threat::{ThreatAnalyzer, ThreatContext};
//!
//! let analyzer = ThreatAnalyzer::heuristic();
//! let incident = analyzer.submit_evidence(&store, id, vec!["email.eml".into()], "analyst")?;
//! ```

pub mod types;
pub mod context;
pub mod rules;
pub mod classifier;
pub mod analyzer;

// Re-export main types for convenience
pub use types::{
    Assessment,
    ThreatAnalysis,
    ThreatSeverity,
};

pub use context::ThreatContext;

pub use rules::{
    CategoryVocabulary,
    ThreatVocabulary,
    ESCALATION_THRESHOLD,
};

pub use classifier::{analyze, HeuristicScorer, SeededRandomScorer, ThreatScorer};
pub use analyzer::ThreatAnalyzer;
