//! Iteration tracking for auto-improve runs.
//!
//! The tracker is an append-only accumulator. It computes the improvement
//! delta of each record from the one before it and projects the whole run
//! into a [`RunSummary`] on demand.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::settings::{RunSettings, ScoreScale};
use super::status::RunStatus;
use crate::error::{AutodocError, Result};
use crate::id::generate_launch_id;

/// One evaluated revision of the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    /// 0 for the initial document, then 1, 2, ...
    pub iteration: u32,
    pub score: f64,
    pub feedback: String,
    /// Score minus the previous record's score, None for iteration 0
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub improvement: Option<f64>,
    /// Where this revision's content lives
    pub artifact_path: String,
}

/// Serializable projection of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub document_id: String,
    pub launch_id: String,
    /// RFC 3339 start time
    pub timestamp: String,
    /// None while the run is incomplete or after it failed
    pub status: Option<RunStatus>,
    pub target_score: f64,
    pub max_iterations: u32,
    pub scale: ScoreScale,
    pub history: Vec<IterationRecord>,
    pub initial_score: Option<f64>,
    pub final_score: Option<f64>,
    pub total_improvement: Option<f64>,
    /// Number of improve/evaluate rounds completed
    pub iterations_used: u32,
    pub duration_secs: f64,
}

impl RunSummary {
    /// Path of the last recorded artifact
    pub fn final_artifact(&self) -> Option<&str> {
        self.history.last().map(|r| r.artifact_path.as_str())
    }
}

/// Accumulates iteration records for a single run
#[derive(Debug, Clone)]
pub struct IterationTracker {
    document_id: String,
    launch_id: String,
    settings: RunSettings,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    status: Option<RunStatus>,
    records: Vec<IterationRecord>,
}

impl IterationTracker {
    pub fn new(document_id: impl Into<String>, settings: RunSettings) -> Self {
        Self::started_at(document_id, settings, Utc::now())
    }

    /// Create a tracker with an explicit start time
    pub fn started_at(document_id: impl Into<String>, settings: RunSettings, started_at: DateTime<Utc>) -> Self {
        let document_id = document_id.into();
        let launch_id = generate_launch_id(&document_id, started_at);
        Self {
            document_id,
            launch_id,
            settings,
            started_at,
            finished_at: None,
            status: None,
            records: Vec::new(),
        }
    }

    /// Append the record for `iteration`.
    ///
    /// Iterations must arrive as 0, 1, 2, ... with no gaps or repeats.
    pub fn record(
        &mut self,
        iteration: u32,
        score: f64,
        feedback: impl Into<String>,
        artifact_path: impl Into<String>,
    ) -> Result<&IterationRecord> {
        let expected = self.records.len() as u32;
        if iteration != expected {
            return Err(AutodocError::Configuration(format!(
                "iteration {} recorded out of order, expected {}",
                iteration, expected
            )));
        }

        let improvement = self.records.last().map(|prev| score - prev.score);
        self.records.push(IterationRecord {
            iteration,
            score,
            feedback: feedback.into(),
            improvement,
            artifact_path: artifact_path.into(),
        });

        Ok(&self.records[self.records.len() - 1])
    }

    /// Mark the run complete with a terminal status
    pub fn finish(&mut self, status: RunStatus) {
        self.status = Some(status);
        self.finished_at = Some(Utc::now());
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn launch_id(&self) -> &str {
        &self.launch_id
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    pub fn status(&self) -> Option<RunStatus> {
        self.status
    }

    pub fn records(&self) -> &[IterationRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&IterationRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Snapshot of the run as it stands now
    pub fn summary(&self) -> RunSummary {
        let initial_score = self.records.first().map(|r| r.score);
        let final_score = self.records.last().map(|r| r.score);
        let total_improvement = initial_score.zip(final_score).map(|(first, last)| last - first);

        let end = self.finished_at.unwrap_or_else(Utc::now);
        let duration_secs = (end - self.started_at).num_milliseconds().max(0) as f64 / 1000.0;

        RunSummary {
            document_id: self.document_id.clone(),
            launch_id: self.launch_id.clone(),
            timestamp: self.started_at.to_rfc3339(),
            status: self.status,
            target_score: self.settings.target_score,
            max_iterations: self.settings.max_iterations,
            scale: self.settings.scale,
            history: self.records.clone(),
            initial_score,
            final_score,
            total_improvement,
            iterations_used: self.records.len().saturating_sub(1) as u32,
            duration_secs,
        }
    }
}
