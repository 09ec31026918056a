//! Auto-improve loop.
//!
//! Evaluates the initial document, then alternates improve and evaluate
//! until a revision meets the target score or the iteration budget is spent.
//! Collaborator failures are not retried; they end the run with an error and
//! leave the tracker holding whatever history was recorded so far.

use std::sync::Arc;

use log::{debug, info};

use super::artifacts::ArtifactStore;
use super::settings::RunSettings;
use super::status::{LoopState, RunStatus};
use super::tracker::{IterationTracker, RunSummary};
use crate::agents::{Evaluator, Improver, SessionToken};
use crate::document::Document;
use crate::error::Result;

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Last document produced, or the initial one if it already met the target
    pub final_document: Document,
    pub summary: RunSummary,
}

impl RunOutcome {
    /// Terminal status, always set for a completed run
    pub fn status(&self) -> Option<RunStatus> {
        self.summary.status
    }
}

/// Drives one document through evaluate/improve rounds.
pub struct AutoImprover<E, I, A>
where
    E: Evaluator,
    I: Improver,
    A: ArtifactStore,
{
    evaluator: Arc<E>,
    improver: Arc<I>,
    artifacts: Arc<A>,
    settings: RunSettings,
}

impl<E, I, A> AutoImprover<E, I, A>
where
    E: Evaluator,
    I: Improver,
    A: ArtifactStore,
{
    /// Create a runner; settings are validated here so a bad run never starts
    pub fn new(evaluator: Arc<E>, improver: Arc<I>, artifacts: Arc<A>, settings: RunSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            evaluator,
            improver,
            artifacts,
            settings,
        })
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Fresh tracker for a run of `document` under these settings
    pub fn tracker_for(&self, document: &Document) -> IterationTracker {
        IterationTracker::new(document.id.clone(), self.settings)
    }

    /// Run the loop to a terminal status
    pub async fn run(&self, initial: &Document, session: Option<&SessionToken>) -> Result<RunOutcome> {
        let mut tracker = self.tracker_for(initial);
        self.run_with_tracker(initial, session, &mut tracker).await
    }

    /// Run the loop, recording into a caller-owned tracker.
    ///
    /// On error the tracker keeps every record appended before the failure
    /// and has no status.
    pub async fn run_with_tracker(
        &self,
        initial: &Document,
        session: Option<&SessionToken>,
        tracker: &mut IterationTracker,
    ) -> Result<RunOutcome> {
        let target = self.settings.target_score;
        let scale = self.settings.scale;
        let evaluator_session = session.map(|s| s.for_role("evaluator"));
        let improver_session = session.map(|s| s.for_role("improver"));
        let mut state = LoopState::NotStarted;

        info!(
            "Starting auto-improve of '{}' (launch {}): target={} max_iterations={}",
            initial.id,
            tracker.launch_id(),
            scale.format(target),
            self.settings.max_iterations
        );

        advance(&mut state, LoopState::Evaluating);
        let evaluation = self.evaluator.evaluate(initial, evaluator_session.as_ref()).await?;
        let artifact = self.artifacts.persist(initial, 0)?;
        tracker.record(0, evaluation.score, evaluation.feedback.as_str(), artifact)?;
        info!("Iteration 0: score {}", scale.format(evaluation.score));

        if evaluation.score >= target {
            advance(&mut state, LoopState::TargetMetOriginal);
            return Ok(finish(tracker, state, initial.clone()));
        }

        let mut current = initial.clone();
        let mut feedback = evaluation.feedback;

        for iteration in 1..=self.settings.max_iterations {
            advance(&mut state, LoopState::Improving);
            let text = self
                .improver
                .improve(&current, &feedback, improver_session.as_ref())
                .await?;
            let candidate = current.revision(text);
            let artifact = self.artifacts.persist(&candidate, iteration)?;

            advance(&mut state, LoopState::Evaluating);
            let evaluation = self.evaluator.evaluate(&candidate, evaluator_session.as_ref()).await?;
            let record = tracker.record(iteration, evaluation.score, evaluation.feedback.as_str(), artifact)?;
            info!(
                "Iteration {}: score {} ({})",
                iteration,
                scale.format(record.score),
                scale.format_delta(record.improvement.unwrap_or_default())
            );

            current = candidate;
            if evaluation.score >= target {
                advance(&mut state, LoopState::TargetReached);
                return Ok(finish(tracker, state, current));
            }
            feedback = evaluation.feedback;
        }

        advance(&mut state, LoopState::MaxIterationsReached);
        Ok(finish(tracker, state, current))
    }
}

fn advance(state: &mut LoopState, next: LoopState) {
    debug_assert!(state.can_transition_to(next), "illegal transition {} -> {}", state, next);
    debug!("Loop state {} -> {}", state, next);
    *state = next;
}

fn finish(tracker: &mut IterationTracker, state: LoopState, final_document: Document) -> RunOutcome {
    if let Some(status) = state.status() {
        tracker.finish(status);
        info!("Run {} finished: {}", tracker.launch_id(), status);
    }
    RunOutcome {
        final_document,
        summary: tracker.summary(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::agents::Evaluation;
    use crate::error::AutodocError;
    use crate::improve::ScoreScale;

    struct ScriptedEvaluator {
        scores: Mutex<VecDeque<f64>>,
        sessions: Mutex<Vec<Option<String>>>,
    }

    impl ScriptedEvaluator {
        fn new(scores: &[f64]) -> Self {
            Self {
                scores: Mutex::new(scores.iter().copied().collect()),
                sessions: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Evaluator for ScriptedEvaluator {
        async fn evaluate(&self, _document: &Document, session: Option<&SessionToken>) -> Result<Evaluation> {
            self.sessions.lock().unwrap().push(session.map(|s| s.to_string()));
            let score = self
                .scores
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| AutodocError::Evaluation("out of scores".to_string()))?;
            Ok(Evaluation::new(score, format!("feedback for {}", score)))
        }
    }

    struct CountingImprover {
        calls: Mutex<Vec<String>>,
    }

    impl CountingImprover {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Improver for CountingImprover {
        async fn improve(&self, document: &Document, feedback: &str, _session: Option<&SessionToken>) -> Result<String> {
            let mut calls = self.calls.lock().unwrap();
            calls.push(feedback.to_string());
            Ok(format!("{} v{}", document.content, calls.len()))
        }
    }

    struct MemoryArtifacts;

    impl ArtifactStore for MemoryArtifacts {
        fn persist(&self, document: &Document, iteration: u32) -> Result<String> {
            Ok(format!("mem://{}/{}", document.id, iteration))
        }
    }

    fn runner(
        scores: &[f64],
        max_iterations: u32,
        target: f64,
    ) -> (AutoImprover<ScriptedEvaluator, CountingImprover, MemoryArtifacts>, Arc<ScriptedEvaluator>, Arc<CountingImprover>) {
        let evaluator = Arc::new(ScriptedEvaluator::new(scores));
        let improver = Arc::new(CountingImprover::new());
        let settings = RunSettings::new(max_iterations, target, ScoreScale::Percent);
        let runner = AutoImprover::new(evaluator.clone(), improver.clone(), Arc::new(MemoryArtifacts), settings).unwrap();
        (runner, evaluator, improver)
    }

    #[tokio::test]
    async fn test_improves_with_latest_feedback() {
        let (runner, _, improver) = runner(&[40.0, 60.0, 90.0], 3, 85.0);
        let outcome = runner.run(&Document::new("doc", "draft"), None).await.unwrap();

        assert_eq!(outcome.status(), Some(RunStatus::TargetReached));
        assert_eq!(outcome.final_document.content, "draft v1 v2");
        assert_eq!(
            *improver.calls.lock().unwrap(),
            vec!["feedback for 40".to_string(), "feedback for 60".to_string()]
        );
    }

    #[tokio::test]
    async fn test_artifact_paths_recorded() {
        let (runner, _, _) = runner(&[40.0, 50.0], 1, 85.0);
        let outcome = runner.run(&Document::new("doc", "draft"), None).await.unwrap();

        let paths: Vec<_> = outcome.summary.history.iter().map(|r| r.artifact_path.as_str()).collect();
        assert_eq!(paths, vec!["mem://doc/0", "mem://doc/1"]);
    }

    #[tokio::test]
    async fn test_session_split_per_role() {
        let (runner, evaluator, _) = runner(&[90.0], 1, 85.0);
        let token = SessionToken::new("autodoc_doc_12345678");
        runner.run(&Document::new("doc", "x"), Some(&token)).await.unwrap();

        assert_eq!(
            *evaluator.sessions.lock().unwrap(),
            vec![Some("autodoc_doc_12345678_evaluator".to_string())]
        );
    }

    #[tokio::test]
    async fn test_invalid_settings_rejected_before_run() {
        let evaluator = Arc::new(ScriptedEvaluator::new(&[]));
        let improver = Arc::new(CountingImprover::new());
        let result = AutoImprover::new(
            evaluator,
            improver,
            Arc::new(MemoryArtifacts),
            RunSettings::new(0, 0.7, ScoreScale::Unit),
        );
        assert!(matches!(result, Err(AutodocError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_evaluation_failure_leaves_partial_history() {
        let (runner, _, _) = runner(&[40.0], 2, 85.0);
        let doc = Document::new("doc", "x");
        let mut tracker = runner.tracker_for(&doc);

        let err = runner.run_with_tracker(&doc, None, &mut tracker).await.unwrap_err();
        assert!(matches!(err, AutodocError::Evaluation(_)));
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.status(), None);
    }
}
