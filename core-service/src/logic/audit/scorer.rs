//! Audit Scorers
//!
//! Seam chấm điểm từng check. Default is a seeded simulation of the
//! dashboard's numbers; tests plug in closures.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::types::{AuditCheckSpec, CheckStatus, CheckVerdict};

/// Probability that a check passes
const PASS_RATE: f64 = 0.7;

/// Scores are drawn from this range
const SCORE_RANGE: std::ops::Range<i64> = 60..100;

pub trait AuditScorer: Send {
    fn evaluate(&mut self, check: &AuditCheckSpec) -> CheckVerdict;
}

impl<F> AuditScorer for F
where
    F: FnMut(&AuditCheckSpec) -> CheckVerdict + Send,
{
    fn evaluate(&mut self, check: &AuditCheckSpec) -> CheckVerdict {
        self(check)
    }
}

/// Random verdicts: ~70% pass, the rest split between warning and fail;
/// score uniform in 60..100.
pub struct SimulatedAuditScorer {
    rng: StdRng,
}

impl SimulatedAuditScorer {
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

    pub fn with_seed(seed: Option<u64>) -> Self {
        seed.map(Self::new).unwrap_or_else(Self::from_entropy)
    }
}

impl AuditScorer for SimulatedAuditScorer {
    fn evaluate(&mut self, _check: &AuditCheckSpec) -> CheckVerdict {
        let status = if self.rng.gen_bool(PASS_RATE) {
            CheckStatus::Pass
        } else if self.rng.gen_bool(0.5) {
            CheckStatus::Warning
        } else {
            CheckStatus::Fail
        };
        CheckVerdict::new(status, self.rng.gen_range(SCORE_RANGE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::audit::default_catalogue;

    #[test]
    fn test_simulated_scores_in_range() {
        let mut scorer = SimulatedAuditScorer::new(3);
        let check = &default_catalogue()[0];
        for _ in 0..200 {
            let verdict = scorer.evaluate(check);
            assert!((60..100).contains(&verdict.score));
        }
    }

    #[test]
    fn test_simulated_is_reproducible() {
        let catalogue = default_catalogue();
        let mut a = SimulatedAuditScorer::new(11);
        let mut b = SimulatedAuditScorer::new(11);
        for check in &catalogue {
            assert_eq!(a.evaluate(check), b.evaluate(check));
        }
    }

    #[test]
    fn test_simulated_mostly_passes() {
        let mut scorer = SimulatedAuditScorer::new(5);
        let check = &default_catalogue()[0];
        let passes = (0..1000)
            .filter(|_| scorer.evaluate(check).status == CheckStatus::Pass)
            .count();
        assert!((600..800).contains(&passes), "passes = {}", passes);
    }

    #[test]
    fn test_closure_scorer() {
        let mut scorer = |c: &AuditCheckSpec| {
            let status = if c.name.contains("Backup") { CheckStatus::Fail } else { CheckStatus::Pass };
            CheckVerdict::new(status, 150)
        };
        let verdict = scorer.evaluate(&default_catalogue()[5]);
        assert_eq!(verdict.status, CheckStatus::Fail);
        assert_eq!(verdict.score, 100);
    }
}
