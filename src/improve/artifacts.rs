//! Per-iteration document artifacts.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::document::{Document, strip_iteration_suffix};
use crate::error::Result;

/// Persists the document produced by each iteration
pub trait ArtifactStore: Send + Sync {
    /// Store `document` as iteration `iteration` and return where it lives
    fn persist(&self, document: &Document, iteration: u32) -> Result<String>;
}

/// Writes iteration artifacts under an output directory.
///
/// Layout: `<output_dir>/<id>/<id>_iter<N><ext>`. The initial document of a
/// run that was read from disk is referenced by its source path instead of
/// being copied. One-off revisions outside a run go to `<id>_improved<ext>`.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    output_dir: PathBuf,
}

impl FsArtifactStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path an iteration of `document` is written to
    pub fn artifact_path(&self, document: &Document, iteration: u32) -> PathBuf {
        self.path_with_suffix(document, &format!("iter{}", iteration))
    }

    /// Path a single revision made outside any run is written to
    pub fn improved_path(&self, document: &Document) -> PathBuf {
        self.path_with_suffix(document, "improved")
    }

    /// Write a one-off revision without touching any run's iteration files
    pub fn save_improved(&self, document: &Document) -> Result<PathBuf> {
        let path = self.improved_path(document);
        write_document(&path, document)?;
        debug!("Wrote revision of '{}' to {}", document.id, path.display());
        Ok(path)
    }

    fn path_with_suffix(&self, document: &Document, suffix: &str) -> PathBuf {
        let base = strip_iteration_suffix(&document.id);
        self.output_dir
            .join(base)
            .join(format!("{}_{}{}", base, suffix, document.extension()))
    }
}

fn write_document(path: &Path, document: &Document) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, &document.content)?;
    Ok(())
}

impl ArtifactStore for FsArtifactStore {
    fn persist(&self, document: &Document, iteration: u32) -> Result<String> {
        if iteration == 0
            && let Some(source) = &document.source
        {
            return Ok(source.display().to_string());
        }

        let path = self.artifact_path(document, iteration);
        write_document(&path, document)?;

        debug!("Wrote iteration {} of '{}' to {}", iteration, document.id, path.display());
        Ok(path.display().to_string())
    }
}
