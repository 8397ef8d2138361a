use super::*;
use crate::logic::config::StageTiming;
use crate::logic::error::EngineError;
use crate::logic::pipeline::{RunState, StepOutcome};

fn spec(name: &str) -> AuditCheckSpec {
    AuditCheckSpec::new(name, &format!("{} detail", name), &format!("Fix {}", name))
}

/// Replays a fixed list of (status, score) in order, then passes with 100
struct Scripted(std::vec::IntoIter<(CheckStatus, i64)>);

impl AuditScorer for Scripted {
    fn evaluate(&mut self, _check: &AuditCheckSpec) -> CheckVerdict {
        let (status, score) = self.0.next().unwrap_or((CheckStatus::Pass, 100));
        CheckVerdict::new(status, score)
    }
}

/// Every run replays the same script from the start
fn scripted(verdicts: Vec<(CheckStatus, i64)>) -> impl Fn() -> Scripted + Send + Sync + 'static {
    move || Scripted(verdicts.clone().into_iter())
}

fn scores(run: &AuditRun) -> Vec<u8> {
    run.results.iter().map(|r| r.score).collect()
}

#[tokio::test]
async fn test_mean_of_three_checks() {
    let engine = AuditEngine::new(
        vec![spec("a"), spec("b"), spec("c")],
        scripted(vec![
            (CheckStatus::Pass, 80),
            (CheckStatus::Warning, 60),
            (CheckStatus::Pass, 100),
        ]),
        StageTiming::instant(),
    )
    .unwrap();

    let (pipeline, run) = engine.plan().unwrap();
    let outcome = pipeline.drive().await;
    assert!(outcome.is_completed());

    let run = run.read().clone();
    assert_eq!(run.state, RunState::Completed);
    assert_eq!(run.overall_score(), Some(80.0));
    assert_eq!(run.terminal_score(), Ok(Some(80.0)));
    assert_eq!(run.posture(), Some(PostureBand::Good));
    assert!(run.finished_at.is_some());
}

#[tokio::test]
async fn test_results_follow_catalogue_order() {
    let catalogue = default_catalogue();
    let engine = AuditEngine::new(catalogue.clone(), || SimulatedAuditScorer::new(1), StageTiming::instant()).unwrap();
    let (pipeline, run) = engine.plan().unwrap();
    pipeline.drive().await;

    let run = run.read();
    let names: Vec<&str> = run.results.iter().map(|r| r.check_name.as_str()).collect();
    let expected: Vec<&str> = catalogue.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, expected);
    assert_eq!(run.results[2].detail, "2 critical vulnerabilities found");
    assert_eq!(run.progress.percent, 100.0);
}

#[tokio::test]
async fn test_running_mean_mid_flight() {
    let engine = AuditEngine::new(
        vec![spec("a"), spec("b"), spec("c"), spec("d")],
        scripted(vec![(CheckStatus::Pass, 90), (CheckStatus::Fail, 61)]),
        StageTiming::instant(),
    )
    .unwrap();
    let (mut pipeline, run) = engine.plan().unwrap();

    assert_eq!(run.read().overall_score(), None);
    pipeline.step().await;
    assert_eq!(run.read().overall_score(), Some(90.0));
    pipeline.step().await;
    assert_eq!(run.read().overall_score(), Some(75.5));
    assert_eq!(run.read().rounded_score(), Some(76));
    assert_eq!(run.read().terminal_score(), Ok(None));
    assert_eq!(run.read().progress.percent, 50.0);
}

#[tokio::test]
async fn test_cancel_after_three_of_eight() {
    let engine = AuditEngine::new(default_catalogue(), || SimulatedAuditScorer::new(9), StageTiming::instant()).unwrap();
    let (mut pipeline, run) = engine.plan().unwrap();

    for _ in 0..3 {
        assert!(matches!(pipeline.step().await, StepOutcome::Advanced(_)));
    }
    pipeline.cancel();
    assert_eq!(pipeline.step().await, StepOutcome::Cancelled);

    let run = run.read().clone();
    assert_eq!(run.results.len(), 3);
    assert_eq!(run.state, RunState::Cancelled);
    assert!(run.progress.percent < 100.0);
    assert!(run.finished_at.is_some());
    assert_eq!(run.terminal_score(), Err(EngineError::Cancelled(run.id)));

    let mid_flight_mean = run.results.iter().map(|r| f64::from(r.score)).sum::<f64>() / 3.0;
    assert_eq!(run.overall_score(), Some(mid_flight_mean));
}

#[tokio::test]
async fn test_handle_wait_cancelled() {
    let engine = AuditEngine::new(
        default_catalogue(),
        || SimulatedAuditScorer::new(2),
        StageTiming::fixed(30),
    )
    .unwrap();
    let handle = engine.start().unwrap();
    handle.cancel();
    let id = handle.id();
    assert_eq!(handle.wait().await.err(), Some(EngineError::Cancelled(id)));
}

#[tokio::test]
async fn test_handle_wait_completed() {
    let engine = AuditEngine::new(default_catalogue(), || SimulatedAuditScorer::new(4), StageTiming::instant()).unwrap();
    let handle = engine.start().unwrap();
    let run = handle.wait().await.unwrap();
    assert_eq!(run.results.len(), 8);
    assert_eq!(run.summary().total(), 8);
    assert!(run.results.iter().all(|r| (60..100).contains(&r.score)));
}

#[test]
fn test_empty_catalogue_rejected() {
    let result = AuditEngine::new(Vec::new(), || SimulatedAuditScorer::new(1), StageTiming::instant());
    assert!(matches!(result, Err(EngineError::InvalidConfiguration(_))));
}

#[test]
fn test_posture_band_boundaries() {
    assert_eq!(PostureBand::from_score(100), PostureBand::Excellent);
    assert_eq!(PostureBand::from_score(90), PostureBand::Excellent);
    assert_eq!(PostureBand::from_score(89), PostureBand::Good);
    assert_eq!(PostureBand::from_score(75), PostureBand::Good);
    assert_eq!(PostureBand::from_score(74), PostureBand::Moderate);
    assert_eq!(PostureBand::from_score(60), PostureBand::Moderate);
    assert_eq!(PostureBand::from_score(59), PostureBand::Poor);
    assert_eq!(PostureBand::from_score(0), PostureBand::Poor);
}

#[tokio::test]
async fn test_recommendations_and_summary() {
    let engine = AuditEngine::new(
        vec![spec("a"), spec("b"), spec("c")],
        scripted(vec![
            (CheckStatus::Fail, 61),
            (CheckStatus::Pass, 95),
            (CheckStatus::Warning, 70),
        ]),
        StageTiming::instant(),
    )
    .unwrap();
    let (pipeline, run) = engine.plan().unwrap();
    pipeline.drive().await;

    let run = run.read().clone();
    assert_eq!(run.recommendations(), vec!["Fix a".to_string(), "Fix c".to_string()]);
    assert_eq!(
        run.summary(),
        AuditSummary { passed: 1, warnings: 1, failed: 1 }
    );

    let report = run.report();
    assert_eq!(report.overall_score, Some(75.33333333333333));
    assert_eq!(report.posture, Some(PostureBand::Good));
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["state"], "completed");
    assert_eq!(json["results"][0]["status"], "fail");
}

#[tokio::test]
async fn test_replaced_run_does_not_shift_next_run() {
    let engine = AuditEngine::new(default_catalogue(), || SimulatedAuditScorer::new(42), StageTiming::instant()).unwrap();

    let (reference, reference_run) = engine.plan().unwrap();
    reference.drive().await;
    let expected = scores(&reference_run.read());

    // One check of a first run, then cancel it as a replacement would
    let (mut first, _) = engine.plan().unwrap();
    assert!(matches!(first.step().await, StepOutcome::Advanced(_)));
    first.cancel();

    let (second, second_run) = engine.plan().unwrap();
    second.drive().await;
    assert_eq!(scores(&second_run.read()), expected);
}

#[tokio::test]
async fn test_runs_of_seeded_engine_repeat() {
    let mut config = crate::logic::config::EngineConfig::for_tests();
    config.seed = Some(11);
    let engine = AuditEngine::from_config(&config).unwrap();

    let first = engine.start().unwrap().wait().await.unwrap();
    let second = engine.start().unwrap().wait().await.unwrap();
    assert_eq!(scores(&first), scores(&second));
}
