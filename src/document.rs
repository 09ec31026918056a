//! Documents flowing through grading and revision.
//!
//! A [`Document`] is immutable: every revision is a new value sharing the
//! identifier of the document it was derived from.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AutodocError, Result};

/// A text document with an identifier derived from its file name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Identifier, the source file stem for loaded documents
    pub id: String,
    /// Full text
    pub content: String,
    /// File the document, or the document it was revised from, was read from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
}

impl Document {
    /// Create an in-memory document
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            source: None,
        }
    }

    /// Read a document from disk; the identifier is the file stem
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(AutodocError::DocumentNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        Ok(Self {
            id: doc_id_for(path),
            content,
            source: Some(path.to_path_buf()),
        })
    }

    /// Produce a new revision carrying the same identifier and origin
    pub fn revision(&self, content: impl Into<String>) -> Self {
        Self {
            id: self.id.clone(),
            content: content.into(),
            source: self.source.clone(),
        }
    }

    /// File extension of the source, including the dot, `.md` when unknown
    pub fn extension(&self) -> String {
        self.source
            .as_deref()
            .and_then(Path::extension)
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext))
            .unwrap_or_else(|| ".md".to_string())
    }

    /// Number of whitespace-separated words
    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }
}

/// Derive a document identifier from a path
///
/// Uses the file stem and drops a trailing `_iterN` so that improving an
/// iteration artifact keeps the original document's identifier.
pub fn doc_id_for(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");

    strip_iteration_suffix(stem).to_string()
}

/// Drop a trailing `_iterN` from an identifier
pub fn strip_iteration_suffix(id: &str) -> &str {
    match id.rsplit_once("_iter") {
        Some((base, n)) if !base.is_empty() && !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()) => base,
        _ => id,
    }
}
