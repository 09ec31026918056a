//! Collaborator capability interfaces.
//!
//! The auto-improve loop only ever talks to these two traits. Scoring and
//! rewriting are delegated entirely to whatever sits behind them.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::Result;
use crate::id::generate_session_token;

/// Score and feedback produced by an evaluator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub score: f64,
    pub feedback: String,
}

impl Evaluation {
    pub fn new(score: f64, feedback: impl Into<String>) -> Self {
        Self {
            score,
            feedback: feedback.into(),
        }
    }
}

/// Opaque session token handed through to collaborators.
///
/// The loop attaches no meaning to it. Backends may use it to keep context
/// across calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Generate a fresh token for a document
    pub fn generate(doc_id: &str) -> Self {
        Self(generate_session_token(doc_id))
    }

    /// Derive a per-role token, e.g. `<token>_evaluator`
    pub fn for_role(&self, role: &str) -> Self {
        Self(format!("{}_{}", self.0, role))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Grades a document
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// Score a document and explain the score.
    ///
    /// Fails with `AutodocError::Evaluation` when the backend is unreachable
    /// or its answer cannot be read as a score and feedback.
    async fn evaluate(&self, document: &Document, session: Option<&SessionToken>) -> Result<Evaluation>;
}

/// Rewrites a document given feedback
#[async_trait]
pub trait Improver: Send + Sync {
    /// Return the revised document text.
    ///
    /// Fails with `AutodocError::Improvement` on backend failure or unusable
    /// output.
    async fn improve(&self, document: &Document, feedback: &str, session: Option<&SessionToken>) -> Result<String>;
}

#[async_trait]
impl<T: Evaluator + ?Sized> Evaluator for Arc<T> {
    async fn evaluate(&self, document: &Document, session: Option<&SessionToken>) -> Result<Evaluation> {
        (**self).evaluate(document, session).await
    }
}

#[async_trait]
impl<T: Improver + ?Sized> Improver for Arc<T> {
    async fn improve(&self, document: &Document, feedback: &str, session: Option<&SessionToken>) -> Result<String> {
        (**self).improve(document, feedback, session).await
    }
}
