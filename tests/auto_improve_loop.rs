//! Auto-improve loop integration tests
//!
//! Drives the loop through the public API with scripted collaborators.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use autodoc::agents::{Evaluation, Evaluator, Improver, SessionToken};
use autodoc::error::{AutodocError, Result};
use autodoc::improve::{ArtifactStore, AutoImprover, RunOutcome, RunSettings, RunStatus, ScoreScale};
use autodoc::Document;

/// Evaluator returning a fixed sequence of scores
struct ScriptedEvaluator {
    scores: Mutex<VecDeque<f64>>,
    calls: Mutex<usize>,
}

impl ScriptedEvaluator {
    fn new(scores: &[f64]) -> Arc<Self> {
        Arc::new(Self {
            scores: Mutex::new(scores.iter().copied().collect()),
            calls: Mutex::new(0),
        })
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl Evaluator for ScriptedEvaluator {
    async fn evaluate(&self, document: &Document, _session: Option<&SessionToken>) -> Result<Evaluation> {
        *self.calls.lock().unwrap() += 1;
        let score = self
            .scores
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AutodocError::Evaluation("no more scripted scores".to_string()))?;
        Ok(Evaluation::new(score, format!("improve '{}'", document.content)))
    }
}

/// Improver appending a revision marker, optionally failing
struct ScriptedImprover {
    fail: bool,
    calls: Mutex<usize>,
}

impl ScriptedImprover {
    fn ok() -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            calls: Mutex::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            calls: Mutex::new(0),
        })
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl Improver for ScriptedImprover {
    async fn improve(&self, document: &Document, _feedback: &str, _session: Option<&SessionToken>) -> Result<String> {
        let mut calls = self.calls.lock().unwrap();
        *calls += 1;
        if self.fail {
            return Err(AutodocError::Improvement("backend unavailable".to_string()));
        }
        Ok(format!("{}+r{}", document.content, *calls))
    }
}

struct MemoryArtifacts {
    written: Mutex<Vec<(u32, String)>>,
}

impl MemoryArtifacts {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            written: Mutex::new(Vec::new()),
        })
    }
}

impl ArtifactStore for MemoryArtifacts {
    fn persist(&self, document: &Document, iteration: u32) -> Result<String> {
        self.written.lock().unwrap().push((iteration, document.content.clone()));
        Ok(format!("memory/{}_iter{}", document.id, iteration))
    }
}

struct Harness {
    evaluator: Arc<ScriptedEvaluator>,
    improver: Arc<ScriptedImprover>,
    artifacts: Arc<MemoryArtifacts>,
    runner: AutoImprover<ScriptedEvaluator, ScriptedImprover, MemoryArtifacts>,
}

fn harness(scores: &[f64], improver: Arc<ScriptedImprover>, max_iterations: u32, target: f64) -> Harness {
    let evaluator = ScriptedEvaluator::new(scores);
    let artifacts = MemoryArtifacts::new();
    let runner = AutoImprover::new(
        evaluator.clone(),
        improver.clone(),
        artifacts.clone(),
        RunSettings::new(max_iterations, target, ScoreScale::Percent),
    )
    .unwrap();
    Harness {
        evaluator,
        improver,
        artifacts,
        runner,
    }
}

fn initial() -> Document {
    Document::new("guide", "draft")
}

fn assert_invariants(outcome: &RunOutcome) {
    let summary = &outcome.summary;
    let history = &summary.history;

    // Iterations are 0..=k with no gaps, k <= cap
    for (i, record) in history.iter().enumerate() {
        assert_eq!(record.iteration, i as u32);
    }
    assert!(history.len() as u32 <= summary.max_iterations + 1);

    // Improvement is the exact delta from the previous record
    assert_eq!(history[0].improvement, None);
    for pair in history.windows(2) {
        assert_eq!(pair[1].improvement, Some(pair[1].score - pair[0].score));
    }

    let last = history.last().unwrap().score;
    match summary.status {
        Some(RunStatus::TargetMetOriginal) => {
            assert_eq!(history.len(), 1);
            assert!(last >= summary.target_score);
        }
        Some(RunStatus::TargetReached) => assert!(last >= summary.target_score),
        Some(RunStatus::MaxIterationsReached) => {
            assert!(last < summary.target_score);
            assert_eq!(history.len() as u32, summary.max_iterations + 1);
        }
        None => panic!("completed run without a status"),
    }
}

/// Initial score 90, target 85: fast exit without improving
#[tokio::test]
async fn test_original_meets_target() {
    let h = harness(&[90.0], ScriptedImprover::ok(), 3, 85.0);
    let doc = initial();

    let outcome = h.runner.run(&doc, None).await.unwrap();

    assert_eq!(outcome.status(), Some(RunStatus::TargetMetOriginal));
    assert_eq!(outcome.summary.history.len(), 1);
    assert_eq!(outcome.final_document, doc);
    assert_eq!(h.improver.calls(), 0);
    assert_eq!(h.evaluator.calls(), 1);
    assert_invariants(&outcome);
}

/// Initial 40, target 85, two iterations scoring 60 then 70
#[tokio::test]
async fn test_max_iterations_reached() {
    let h = harness(&[40.0, 60.0, 70.0], ScriptedImprover::ok(), 2, 85.0);

    let outcome = h.runner.run(&initial(), None).await.unwrap();

    assert_eq!(outcome.status(), Some(RunStatus::MaxIterationsReached));
    assert_eq!(outcome.summary.history.len(), 3);
    assert_eq!(outcome.summary.final_score, Some(70.0));
    assert_eq!(outcome.summary.total_improvement, Some(30.0));
    assert_eq!(outcome.summary.iterations_used, 2);
    assert_eq!(outcome.final_document.content, "draft+r1+r2");
    assert_invariants(&outcome);
}

/// Initial 40, target 85, cap 3, scores 50 then 90: stops after iteration 2
#[tokio::test]
async fn test_target_reached_early() {
    let h = harness(&[40.0, 50.0, 90.0, 99.0], ScriptedImprover::ok(), 3, 85.0);

    let outcome = h.runner.run(&initial(), None).await.unwrap();

    assert_eq!(outcome.status(), Some(RunStatus::TargetReached));
    assert_eq!(outcome.summary.history.len(), 3);
    assert_eq!(outcome.final_document.content, "draft+r1+r2");
    assert_eq!(h.improver.calls(), 2);
    assert_eq!(h.evaluator.calls(), 3);
    assert_invariants(&outcome);
}

/// Cap 1 with a failing improver: the error propagates, history stays at 1
#[tokio::test]
async fn test_improver_failure_aborts_run() {
    let h = harness(&[40.0], ScriptedImprover::failing(), 1, 85.0);
    let doc = initial();
    let mut tracker = h.runner.tracker_for(&doc);

    let err = h.runner.run_with_tracker(&doc, None, &mut tracker).await.unwrap_err();

    assert!(matches!(err, AutodocError::Improvement(_)));
    assert_eq!(tracker.len(), 1);
    assert_eq!(tracker.records()[0].iteration, 0);
    assert_eq!(tracker.status(), None);
    assert_eq!(tracker.summary().status, None);
}

#[tokio::test]
async fn test_target_met_on_equality() {
    let h = harness(&[40.0, 85.0], ScriptedImprover::ok(), 3, 85.0);
    let outcome = h.runner.run(&initial(), None).await.unwrap();

    assert_eq!(outcome.status(), Some(RunStatus::TargetReached));
    assert_eq!(outcome.summary.history.len(), 2);
    assert_invariants(&outcome);
}

#[tokio::test]
async fn test_score_can_regress() {
    let h = harness(&[50.0, 45.0, 48.0], ScriptedImprover::ok(), 2, 85.0);
    let outcome = h.runner.run(&initial(), None).await.unwrap();

    let improvements: Vec<_> = outcome.summary.history.iter().map(|r| r.improvement).collect();
    assert_eq!(improvements, vec![None, Some(-5.0), Some(3.0)]);
    assert_eq!(outcome.summary.total_improvement, Some(-2.0));
    assert_invariants(&outcome);
}

/// The loop never exceeds cap + 1 evaluations and cap improvements
#[tokio::test]
async fn test_call_budget_bounded() {
    for cap in 1..=5u32 {
        let scores = vec![10.0; cap as usize + 10];
        let h = harness(&scores, ScriptedImprover::ok(), cap, 85.0);

        let outcome = h.runner.run(&initial(), None).await.unwrap();

        assert_eq!(h.evaluator.calls(), cap as usize + 1);
        assert_eq!(h.improver.calls(), cap as usize);
        assert_invariants(&outcome);
    }
}

#[tokio::test]
async fn test_every_iteration_persisted() {
    let h = harness(&[40.0, 60.0, 70.0], ScriptedImprover::ok(), 2, 85.0);
    let outcome = h.runner.run(&initial(), None).await.unwrap();

    let written = h.artifacts.written.lock().unwrap().clone();
    assert_eq!(
        written,
        vec![
            (0, "draft".to_string()),
            (1, "draft+r1".to_string()),
            (2, "draft+r1+r2".to_string()),
        ]
    );
    assert_eq!(outcome.summary.final_artifact(), Some("memory/guide_iter2"));
}

#[tokio::test]
async fn test_evaluator_failure_mid_run() {
    // Third evaluation has no scripted score
    let h = harness(&[40.0, 60.0], ScriptedImprover::ok(), 3, 85.0);
    let doc = initial();
    let mut tracker = h.runner.tracker_for(&doc);

    let err = h.runner.run_with_tracker(&doc, None, &mut tracker).await.unwrap_err();

    assert!(matches!(err, AutodocError::Evaluation(_)));
    assert_eq!(tracker.len(), 2);
    assert_eq!(tracker.status(), None);
}

#[test]
fn test_zero_iterations_is_configuration_error() {
    let result = AutoImprover::new(
        ScriptedEvaluator::new(&[]),
        ScriptedImprover::ok(),
        MemoryArtifacts::new(),
        RunSettings::new(0, 85.0, ScoreScale::Percent),
    );
    assert!(matches!(result, Err(AutodocError::Configuration(_))));
}

#[test]
fn test_target_outside_scale_is_configuration_error() {
    let result = AutoImprover::new(
        ScriptedEvaluator::new(&[]),
        ScriptedImprover::ok(),
        MemoryArtifacts::new(),
        RunSettings::new(3, 85.0, ScoreScale::Unit),
    );
    assert!(matches!(result, Err(AutodocError::Configuration(_))));
}
