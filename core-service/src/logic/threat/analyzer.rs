//! Threat Analysis Attacher
//!
//! Nhận evidence submission, chạy scorer, gắn kết quả vào incident.

use parking_lot::Mutex;
use uuid::Uuid;

use super::classifier::{analyze, HeuristicScorer, ThreatScorer};
use super::context::ThreatContext;
use super::rules::ThreatVocabulary;
use super::types::ThreatAnalysis;
use crate::logic::error::{EngineError, EngineResult};
use crate::logic::incident::{Incident, IncidentStore};

pub struct ThreatAnalyzer {
    scorer: Mutex<Box<dyn ThreatScorer>>,
    vocabulary: ThreatVocabulary,
}

impl ThreatAnalyzer {
    pub fn new(scorer: Box<dyn ThreatScorer>, vocabulary: ThreatVocabulary) -> EngineResult<Self> {
        vocabulary.validate()?;
        Ok(Self {
            scorer: Mutex::new(scorer),
            vocabulary,
        })
    }

    /// Deterministic scorer with the built-in vocabulary
    pub fn heuristic() -> Self {
        Self {
            scorer: Mutex::new(Box::new(HeuristicScorer)),
            vocabulary: ThreatVocabulary::default(),
        }
    }

    pub fn vocabulary(&self) -> &ThreatVocabulary {
        &self.vocabulary
    }

    pub fn scorer_name(&self) -> String {
        self.scorer.lock().name().to_string()
    }

    pub fn analyze(&self, evidence_refs: &[String], context: &ThreatContext) -> EngineResult<ThreatAnalysis> {
        let mut scorer = self.scorer.lock();
        analyze(evidence_refs, context, scorer.as_mut(), &self.vocabulary)
    }

    /// Evidence submission event: append `refs`, re-analyze over all of the
    /// incident's evidence and replace its analysis. Status is untouched.
    ///
    /// Nothing is written if analysis fails.
    pub fn submit_evidence(
        &self,
        store: &IncidentStore,
        id: Uuid,
        refs: Vec<String>,
        actor: &str,
    ) -> EngineResult<Incident> {
        let refs: Vec<String> = refs
            .into_iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();

        let incident = store.update(id, |inc| {
            if refs.is_empty() {
                return Err(EngineError::InsufficientEvidence);
            }
            let mut all = inc.evidence_refs.clone();
            all.extend(refs.iter().cloned());

            let analysis = self.analyze(&all, &ThreatContext::from_incident(inc))?;
            inc.append_evidence(refs, actor);
            inc.set_analysis(analysis);
            Ok(())
        })?;

        log::info!(
            "Evidence submitted for incident {} ({} total), threat level {}",
            id,
            incident.evidence_refs.len(),
            incident.analysis.as_ref().map(|a| a.threat_level).unwrap_or(0)
        );
        Ok(incident)
    }

    /// Explicit re-analysis of the evidence already on the incident
    pub fn reanalyze(&self, store: &IncidentStore, id: Uuid) -> EngineResult<Incident> {
        store.update(id, |inc| {
            let analysis = self.analyze(&inc.evidence_refs, &ThreatContext::from_incident(inc))?;
            inc.set_analysis(analysis);
            Ok(())
        })
    }
}

impl Default for ThreatAnalyzer {
    fn default() -> Self {
        Self::heuristic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::incident::{IncidentCategory, IncidentStatus, NewIncident, Priority};
    use crate::logic::threat::SeededRandomScorer;

    fn store_with_phishing() -> (IncidentStore, Uuid) {
        let store = IncidentStore::default();
        let id = store
            .create(NewIncident {
                title: "Fake payroll notice".to_string(),
                category: IncidentCategory::Phishing,
                priority: Some(Priority::High),
                reported_by: "hr".to_string(),
                evidence_refs: vec!["email.eml".to_string()],
                ..Default::default()
            })
            .unwrap()
            .id;
        (store, id)
    }

    #[test]
    fn test_submit_evidence_attaches_analysis() {
        let (store, id) = store_with_phishing();
        let analyzer = ThreatAnalyzer::heuristic();

        let inc = analyzer
            .submit_evidence(&store, id, vec!["landing.html".to_string()], "analyst")
            .unwrap();
        assert_eq!(inc.status, IncidentStatus::Analyzing);
        assert_eq!(inc.evidence_refs.len(), 2);
        let analysis = inc.analysis.unwrap();
        assert_eq!(analysis.evidence_count, 2);
        assert!(analysis.threat_level <= 100);
    }

    #[test]
    fn test_new_submission_replaces_analysis() {
        let (store, id) = store_with_phishing();
        let analyzer = ThreatAnalyzer::heuristic();

        let first = analyzer
            .submit_evidence(&store, id, vec!["a.txt".to_string()], "analyst")
            .unwrap()
            .analysis
            .unwrap();
        let second = analyzer
            .submit_evidence(&store, id, vec!["b.eml".to_string(), "c.eml".to_string()], "analyst")
            .unwrap()
            .analysis
            .unwrap();

        assert_ne!(first.evidence_count, second.evidence_count);
        assert!(second.threat_level > first.threat_level);
        assert_eq!(store.get(id).unwrap().analysis.unwrap(), second);
    }

    #[test]
    fn test_empty_submission_rejected_without_mutation() {
        let (store, id) = store_with_phishing();
        let analyzer = ThreatAnalyzer::heuristic();
        let before = store.get(id).unwrap();

        let err = analyzer
            .submit_evidence(&store, id, vec![" ".to_string()], "analyst")
            .unwrap_err();
        assert_eq!(err, EngineError::InsufficientEvidence);

        let after = store.get(id).unwrap();
        assert_eq!(after.evidence_refs, before.evidence_refs);
        assert!(after.analysis.is_none());
    }

    #[test]
    fn test_submit_unknown_incident() {
        let store = IncidentStore::default();
        let analyzer = ThreatAnalyzer::heuristic();
        let id = Uuid::new_v4();
        assert_eq!(
            analyzer.submit_evidence(&store, id, vec!["x".into()], "a").unwrap_err(),
            EngineError::NotFound(id)
        );
    }

    #[test]
    fn test_custom_scorer_and_invalid_vocabulary() {
        let mut vocab = ThreatVocabulary::default();
        vocab.categories.clear();
        let result = ThreatAnalyzer::new(Box::new(SeededRandomScorer::new(1)), vocab);
        assert!(matches!(result, Err(EngineError::InvalidConfiguration(_))));

        let analyzer =
            ThreatAnalyzer::new(Box::new(SeededRandomScorer::new(1)), ThreatVocabulary::default())
                .unwrap();
        assert_eq!(analyzer.scorer_name(), "seeded-random");
    }

    #[test]
    fn test_reanalyze_uses_existing_evidence() {
        let (store, id) = store_with_phishing();
        let analyzer = ThreatAnalyzer::heuristic();
        let inc = analyzer.reanalyze(&store, id).unwrap();
        assert_eq!(inc.analysis.unwrap().evidence_count, 1);
    }
}
