//! Storage layer - flat JSON persistence for runs and collaborator calls.

mod calls;
mod runs;

pub use calls::{CallKind, CallMetadata, CallRecorder, RecordingEvaluator, RecordingImprover};
pub use runs::RunStore;
