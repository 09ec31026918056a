//! Recording of individual collaborator calls.
//!
//! Every evaluate or improve call can be kept on disk as
//! `<out>/calls/<kind>_<timestamp>_<hex>/` holding `input.txt`, `output.txt`
//! and `metadata.json`.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::agents::{Evaluation, Evaluator, Improver, SessionToken};
use crate::document::Document;
use crate::error::Result;
use crate::id::generate_call_id;

/// Which collaborator a recorded call went to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallKind {
    Evaluate,
    Improve,
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallKind::Evaluate => f.write_str("evaluate"),
            CallKind::Improve => f.write_str("improve"),
        }
    }
}

/// Contents of `metadata.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallMetadata {
    pub kind: CallKind,
    pub document_id: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub session: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub feedback: Option<String>,
}

/// Writes call records under `<out>/calls`
#[derive(Debug, Clone)]
pub struct CallRecorder {
    calls_dir: PathBuf,
}

impl CallRecorder {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            calls_dir: output_dir.as_ref().join("calls"),
        }
    }

    pub fn calls_dir(&self) -> &Path {
        &self.calls_dir
    }

    /// Persist one call and return its directory
    pub fn record(&self, metadata: &CallMetadata, input: &str, output: &str) -> Result<PathBuf> {
        let dir = self.calls_dir.join(generate_call_id(&metadata.kind.to_string()));
        fs::create_dir_all(&dir)?;

        fs::write(dir.join("input.txt"), input)?;
        fs::write(dir.join("output.txt"), output)?;
        fs::write(dir.join("metadata.json"), serde_json::to_string_pretty(metadata)?)?;

        debug!("Recorded {} call for '{}' in {}", metadata.kind, metadata.document_id, dir.display());
        Ok(dir)
    }

    fn record_or_warn(&self, metadata: &CallMetadata, input: &str, output: &str) {
        if let Err(e) = self.record(metadata, input, output) {
            warn!("Failed to record {} call for '{}': {}", metadata.kind, metadata.document_id, e);
        }
    }
}

fn metadata(kind: CallKind, document: &Document, session: Option<&SessionToken>) -> CallMetadata {
    CallMetadata {
        kind,
        document_id: document.id.clone(),
        timestamp: Utc::now().to_rfc3339(),
        session: session.map(|s| s.to_string()),
        score: None,
        feedback: None,
    }
}

/// Evaluator that records each successful call
pub struct RecordingEvaluator<E> {
    inner: E,
    recorder: Arc<CallRecorder>,
}

impl<E: Evaluator> RecordingEvaluator<E> {
    pub fn new(inner: E, recorder: Arc<CallRecorder>) -> Self {
        Self { inner, recorder }
    }
}

#[async_trait]
impl<E: Evaluator> Evaluator for RecordingEvaluator<E> {
    async fn evaluate(&self, document: &Document, session: Option<&SessionToken>) -> Result<Evaluation> {
        let evaluation = self.inner.evaluate(document, session).await?;

        let mut meta = metadata(CallKind::Evaluate, document, session);
        meta.score = Some(evaluation.score);
        meta.feedback = Some(evaluation.feedback.clone());
        let output = format!("Score: {}\nFeedback: {}", evaluation.score, evaluation.feedback);
        self.recorder.record_or_warn(&meta, &document.content, &output);

        Ok(evaluation)
    }
}

/// Improver that records each successful call
pub struct RecordingImprover<I> {
    inner: I,
    recorder: Arc<CallRecorder>,
}

impl<I: Improver> RecordingImprover<I> {
    pub fn new(inner: I, recorder: Arc<CallRecorder>) -> Self {
        Self { inner, recorder }
    }
}

#[async_trait]
impl<I: Improver> Improver for RecordingImprover<I> {
    async fn improve(&self, document: &Document, feedback: &str, session: Option<&SessionToken>) -> Result<String> {
        let improved = self.inner.improve(document, feedback, session).await?;

        let mut meta = metadata(CallKind::Improve, document, session);
        meta.feedback = Some(feedback.to_string());
        self.recorder.record_or_warn(&meta, &document.content, &improved);

        Ok(improved)
    }
}
