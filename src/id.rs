//! ID generation utilities for autodoc
//!
//! Provides functions for generating identifiers for runs, sessions and
//! recorded collaborator calls.

use chrono::{DateTime, Utc};
use rand::Rng;

/// Generate a launch ID for one auto-improve run
///
/// Format: `doc-improve-{doc_id}-{YYYYmmdd-HHMMSS}`
/// Example: `doc-improve-readme-20260114-093012`
pub fn generate_launch_id(doc_id: &str, started_at: DateTime<Utc>) -> String {
    format!("doc-improve-{}-{}", doc_id, started_at.format("%Y%m%d-%H%M%S"))
}

/// Generate a session token for a document
///
/// Format: `autodoc_{doc_id}_{random_hex}`
/// Example: `autodoc_readme_3f9a0c12`
pub fn generate_session_token(doc_id: &str) -> String {
    let random: u32 = rand::rng().random();
    format!("autodoc_{}_{:08x}", doc_id, random)
}

/// Generate the directory name for a recorded collaborator call
///
/// Format: `{kind}_{YYYYmmddTHHMMSSZ}_{random_hex}`
pub fn generate_call_id(kind: &str) -> String {
    let random: u32 = rand::rng().random();
    format!("{}_{}_{:08x}", kind, Utc::now().format("%Y%m%dT%H%M%SZ"), random)
}
