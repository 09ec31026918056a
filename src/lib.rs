//! Autodoc - LLM-driven document grading and revision
//!
//! Autodoc grades Markdown documents with an evaluator agent and revises them
//! with an improver agent, looping until a target score is met or the
//! iteration budget runs out. Every iteration is tracked and persisted.

pub mod agents;
pub mod document;
pub mod error;
pub mod id;
pub mod improve;
pub mod llm;
pub mod prompt;
pub mod storage;

pub use document::Document;
pub use error::{AutodocError, Result};
