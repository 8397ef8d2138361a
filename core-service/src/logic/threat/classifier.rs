//! Threat Scoring
//!
//! CHỈ chứa logic scoring - không có types, không có storage.
//! Input: evidence refs, ThreatContext, vocabulary
//! Output: ThreatAnalysis
//!
//! The scoring formula is pluggable (`ThreatScorer`); `analyze` enforces
//! the output contract no matter which scorer is used.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::context::ThreatContext;
use super::rules::{
    category_signals, priority_base, CategoryVocabulary, ThreatVocabulary, AFFECTED_SYSTEM_WEIGHT,
    BASE_CONFIDENCE, CONFIDENCE_PER_EVIDENCE, ESCALATION_RECOMMENDATION, ESCALATION_THRESHOLD,
    EVIDENCE_CAP, EVIDENCE_WEIGHT, MAX_HEURISTIC_CONFIDENCE, SIGNAL_WEIGHT,
};
use super::types::{clamp_score, Assessment, ThreatAnalysis};
use crate::logic::error::{EngineError, EngineResult};

// ============================================================================
// SCORER TRAIT
// ============================================================================

/// Pluggable scoring strategy
pub trait ThreatScorer: Send {
    /// Short name recorded on every analysis
    fn name(&self) -> &str;

    /// `evidence` is never empty when called through `analyze`
    fn assess(
        &mut self,
        evidence: &[String],
        context: &ThreatContext,
        vocabulary: &CategoryVocabulary,
    ) -> Assessment;
}

// ============================================================================
// MAIN ANALYSIS FUNCTION
// ============================================================================

/// Score `evidence` and shape the result into a valid `ThreatAnalysis`
pub fn analyze(
    evidence_refs: &[String],
    context: &ThreatContext,
    scorer: &mut dyn ThreatScorer,
    vocabulary: &ThreatVocabulary,
) -> EngineResult<ThreatAnalysis> {
    let evidence: Vec<String> = evidence_refs
        .iter()
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .collect();
    if evidence.is_empty() {
        return Err(EngineError::InsufficientEvidence);
    }

    let vocab = vocabulary.for_category(context.category)?;
    let assessment = scorer.assess(&evidence, context, vocab);

    // Closed vocabulary: keep the configured spelling, drop anything unknown
    let mut indicators: Vec<String> = assessment
        .indicators
        .iter()
        .filter_map(|label| {
            vocab
                .indicators
                .iter()
                .find(|known| known.eq_ignore_ascii_case(label.trim()))
                .cloned()
        })
        .collect();
    if indicators.is_empty() {
        if let Some(first) = vocab.indicators.iter().find(|i| !i.trim().is_empty()) {
            indicators.push(first.clone());
        }
    }

    let threat_level = clamp_score(assessment.threat_level);
    let mut recommendations = Vec::with_capacity(vocab.recommendations.len() + 1);
    if threat_level >= ESCALATION_THRESHOLD {
        recommendations.push(ESCALATION_RECOMMENDATION.to_string());
    }
    recommendations.extend(vocab.recommendations.iter().cloned());

    let analysis = ThreatAnalysis::build(
        assessment.threat_level,
        assessment.confidence,
        indicators,
        recommendations,
        scorer.name(),
        evidence.len(),
    )?;

    log::debug!(
        "[{}] {} evidence -> level {}, confidence {}",
        scorer.name(),
        evidence.len(),
        analysis.threat_level,
        analysis.confidence
    );
    Ok(analysis)
}

// ============================================================================
// HEURISTIC SCORER (deterministic, default)
// ============================================================================

/// Deterministic scoring from priority, evidence volume and file types
#[derive(Debug, Clone, Default)]
pub struct HeuristicScorer;

impl HeuristicScorer {
    fn signal_hits(evidence: &[String], context: &ThreatContext) -> usize {
        let signals = category_signals(context.category);
        evidence
            .iter()
            .filter(|e| {
                e.rsplit_once('.')
                    .map(|(_, ext)| signals.iter().any(|s| s.eq_ignore_ascii_case(ext)))
                    .unwrap_or(false)
            })
            .count()
    }
}

impl ThreatScorer for HeuristicScorer {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn assess(
        &mut self,
        evidence: &[String],
        context: &ThreatContext,
        vocabulary: &CategoryVocabulary,
    ) -> Assessment {
        let count = evidence.len() as i64;
        let hits = Self::signal_hits(evidence, context);

        let mut level = priority_base(context.priority);
        level += (count * EVIDENCE_WEIGHT).min(EVIDENCE_CAP);
        level += (context.affected_systems as i64 * AFFECTED_SYSTEM_WEIGHT).min(20);
        level += (hits as i64 * SIGNAL_WEIGHT).min(3 * SIGNAL_WEIGHT);

        let mut confidence = BASE_CONFIDENCE + count * CONFIDENCE_PER_EVIDENCE;
        if context.description.is_some() {
            confidence += 5;
        }
        let confidence = confidence.min(MAX_HEURISTIC_CONFIDENCE);

        // One label, plus one per category signal, plus one for a large evidence set
        let wanted = 1 + hits + usize::from(evidence.len() > 2);
        let indicators = vocabulary.indicators.iter().take(wanted).cloned().collect();

        Assessment {
            threat_level: level,
            confidence,
            indicators,
        }
    }
}

// ============================================================================
// SEEDED RANDOM SCORER (dashboard stand-in)
// ============================================================================

/// Random scores in a plausible range, reproducible with a fixed seed
pub struct SeededRandomScorer {
    rng: StdRng,
}

impl SeededRandomScorer {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl ThreatScorer for SeededRandomScorer {
    fn name(&self) -> &str {
        "seeded-random"
    }

    fn assess(
        &mut self,
        _evidence: &[String],
        _context: &ThreatContext,
        vocabulary: &CategoryVocabulary,
    ) -> Assessment {
        let threat_level = self.rng.gen_range(20..=95);
        let confidence = self.rng.gen_range(60..=98);
        let count = self.rng.gen_range(1..=vocabulary.indicators.len().max(1));
        let indicators = vocabulary
            .indicators
            .choose_multiple(&mut self.rng, count)
            .cloned()
            .collect();

        Assessment {
            threat_level,
            confidence,
            indicators,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::incident::{IncidentCategory, Priority};

    /// Scorer returning fixed numbers, for contract tests
    struct FixedScorer(Assessment);

    impl ThreatScorer for FixedScorer {
        fn name(&self) -> &str {
            "fixed"
        }
        fn assess(&mut self, _: &[String], _: &ThreatContext, _: &CategoryVocabulary) -> Assessment {
            self.0.clone()
        }
    }

    fn refs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_evidence_rejected() {
        let ctx = ThreatContext::new(IncidentCategory::Phishing, Priority::High);
        let vocab = ThreatVocabulary::default();
        let result = analyze(&[], &ctx, &mut HeuristicScorer, &vocab);
        assert_eq!(result.unwrap_err(), EngineError::InsufficientEvidence);

        let blank = analyze(&refs(&["  "]), &ctx, &mut HeuristicScorer, &vocab);
        assert_eq!(blank.unwrap_err(), EngineError::InsufficientEvidence);
    }

    #[test]
    fn test_heuristic_phishing_email() {
        let ctx = ThreatContext::new(IncidentCategory::Phishing, Priority::High);
        let vocab = ThreatVocabulary::default();
        let a = analyze(&refs(&["email.eml"]), &ctx, &mut HeuristicScorer, &vocab).unwrap();

        // 45 base + 6 evidence + 12 signal
        assert_eq!(a.threat_level, 63);
        assert_eq!(a.confidence, 55);
        assert!(a.indicators.contains("Spoofed sender"));
        assert!(a.indicators.contains("Credential harvesting"));
        assert_eq!(a.scorer, "heuristic");
        assert!(!a.recommendations.is_empty());
    }

    #[test]
    fn test_heuristic_is_deterministic() {
        let ctx = ThreatContext::new(IncidentCategory::Malware, Priority::Critical)
            .with_affected_systems(4);
        let vocab = ThreatVocabulary::default();
        let evidence = refs(&["dropper.exe", "loader.dll", "notes.txt"]);

        let a = analyze(&evidence, &ctx, &mut HeuristicScorer, &vocab).unwrap();
        let b = analyze(&evidence, &ctx, &mut HeuristicScorer, &vocab).unwrap();
        assert_eq!(a.threat_level, b.threat_level);
        assert_eq!(a.indicators, b.indicators);
        // 60 + 18 + 16 + 24 = 118 -> clamped
        assert_eq!(a.threat_level, 100);
        assert_eq!(a.recommendations[0], ESCALATION_RECOMMENDATION);
    }

    #[test]
    fn test_out_of_range_scores_clamped() {
        let vocab = ThreatVocabulary::default();
        let ctx = ThreatContext::new(IncidentCategory::Fraud, Priority::Low);
        let mut scorer = FixedScorer(Assessment {
            threat_level: -40,
            confidence: 400,
            indicators: vec![],
        });
        let a = analyze(&refs(&["ledger.csv"]), &ctx, &mut scorer, &vocab).unwrap();
        assert_eq!(a.threat_level, 0);
        assert_eq!(a.confidence, 100);
    }

    #[test]
    fn test_unknown_indicators_dropped_with_fallback() {
        let vocab = ThreatVocabulary::default();
        let ctx = ThreatContext::new(IncidentCategory::Espionage, Priority::Medium);
        let mut scorer = FixedScorer(Assessment {
            threat_level: 50,
            confidence: 50,
            indicators: vec!["made up label".to_string()],
        });
        let a = analyze(&refs(&["trace.pcap"]), &ctx, &mut scorer, &vocab).unwrap();
        assert_eq!(a.indicators.len(), 1);
        assert!(a.indicators.contains("Location harvesting"));
    }

    #[test]
    fn test_indicator_case_normalized_to_vocabulary() {
        let vocab = ThreatVocabulary::default();
        let ctx = ThreatContext::new(IncidentCategory::Phishing, Priority::Medium);
        let mut scorer = FixedScorer(Assessment {
            threat_level: 10,
            confidence: 10,
            indicators: vec!["MALICIOUS LINK".to_string()],
        });
        let a = analyze(&refs(&["a.eml"]), &ctx, &mut scorer, &vocab).unwrap();
        assert!(a.indicators.contains("Malicious link"));
    }

    #[test]
    fn test_seeded_scorer_contract_holds() {
        let vocab = ThreatVocabulary::default();
        let mut scorer = SeededRandomScorer::new(42);
        for category in IncidentCategory::ALL {
            let ctx = ThreatContext::new(category, Priority::Medium);
            for _ in 0..25 {
                let a = analyze(&refs(&["evidence.bin"]), &ctx, &mut scorer, &vocab).unwrap();
                assert!(a.threat_level <= 100);
                assert!(a.confidence <= 100);
                assert!(!a.indicators.is_empty());
                assert!(!a.recommendations.is_empty());
                let category_vocab = vocab.for_category(category).unwrap();
                assert!(a.indicators.iter().all(|i| category_vocab.contains_indicator(i)));
            }
        }
    }

    #[test]
    fn test_seeded_scorer_reproducible() {
        let vocab = ThreatVocabulary::default();
        let ctx = ThreatContext::new(IncidentCategory::Malware, Priority::High);
        let evidence = refs(&["sample.exe"]);

        let a = analyze(&evidence, &ctx, &mut SeededRandomScorer::new(7), &vocab).unwrap();
        let b = analyze(&evidence, &ctx, &mut SeededRandomScorer::new(7), &vocab).unwrap();
        assert_eq!(a.threat_level, b.threat_level);
        assert_eq!(a.confidence, b.confidence);
        assert_eq!(a.indicators, b.indicators);
    }
}
