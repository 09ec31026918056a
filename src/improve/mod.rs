//! Auto-improve control loop
//!
//! This module provides:
//! - Run settings and score scales
//! - The loop state machine and terminal run status
//! - Iteration tracking and run summaries
//! - Per-iteration artifact persistence
//! - The AutoImprover runner

mod artifacts;
mod runner;
mod settings;
mod status;
mod tracker;

pub use artifacts::{ArtifactStore, FsArtifactStore};
pub use runner::{AutoImprover, RunOutcome};
pub use settings::{DEFAULT_MAX_ITERATIONS, DEFAULT_TARGET_SCORE, RunSettings, ScoreScale};
pub use status::{LoopState, RunStatus};
pub use tracker::{IterationRecord, IterationTracker, RunSummary};
