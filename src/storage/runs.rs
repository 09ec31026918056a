//! Run summary persistence.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::document::strip_iteration_suffix;
use crate::error::Result;
use crate::improve::RunSummary;

const RUNS_LOG: &str = "runs.jsonl";

/// Stores finished run summaries as flat JSON files.
///
/// Each run writes `<out>/<id>/<id>_tracking.json` (the latest run of a
/// document) and appends one line to `<out>/runs.jsonl` (every run).
#[derive(Debug, Clone)]
pub struct RunStore {
    output_dir: PathBuf,
}

impl RunStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path of the tracking file for a document
    pub fn tracking_path(&self, document_id: &str) -> PathBuf {
        let base = strip_iteration_suffix(document_id);
        self.output_dir.join(base).join(format!("{}_tracking.json", base))
    }

    fn runs_log_path(&self) -> PathBuf {
        self.output_dir.join(RUNS_LOG)
    }

    /// Write the summary and append it to the run log
    pub fn save_summary(&self, summary: &RunSummary) -> Result<PathBuf> {
        let path = self.tracking_path(&summary.document_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, serde_json::to_string_pretty(summary)?)?;

        let mut log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.runs_log_path())?;
        writeln!(log, "{}", serde_json::to_string(summary)?)?;

        debug!("Saved run {} to {}", summary.launch_id, path.display());
        Ok(path)
    }

    /// Latest saved summary for a document
    pub fn load_summary(&self, document_id: &str) -> Result<Option<RunSummary>> {
        let path = self.tracking_path(document_id);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Every run in the log, oldest first.
    ///
    /// Lines that fail to parse are skipped with a warning.
    pub fn list_runs(&self) -> Result<Vec<RunSummary>> {
        let path = self.runs_log_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&path)?);
        let mut runs = Vec::new();
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(summary) => runs.push(summary),
                Err(e) => warn!("Skipping bad line {} in {}: {}", lineno + 1, path.display(), e),
            }
        }
        Ok(runs)
    }
}
