//! Error types for autodoc
//!
//! Centralized error handling using thiserror.

use std::path::PathBuf;

use thiserror::Error;

/// All error types that can occur in autodoc
#[derive(Debug, Error)]
pub enum AutodocError {
    /// Evaluator failed or returned output that is not a score and feedback
    #[error("Evaluation failed: {0}")]
    Evaluation(String),

    /// Improver failed or returned unusable text
    #[error("Improvement failed: {0}")]
    Improvement(String),

    /// Run settings rejected before the loop starts
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// LLM API error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Prompt template could not be loaded or rendered
    #[error("Template error: {0}")]
    Template(String),

    /// Input document does not exist
    #[error("Document not found: {}", .0.display())]
    DocumentNotFound(PathBuf),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AutodocError {
    /// Returns true for errors raised by one of the two collaborators
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(self, AutodocError::Evaluation(_) | AutodocError::Improvement(_))
    }
}

/// Result type alias for autodoc operations
pub type Result<T> = std::result::Result<T, AutodocError>;
