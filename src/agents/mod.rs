//! Collaborators - evaluator and improver agents
//!
//! This module provides:
//! - Evaluator and Improver capability traits consumed by the loop
//! - LLM-backed implementations of both
//! - Parsing of raw agent responses

mod evaluator;
mod improver;
pub mod parse;
mod traits;

pub use evaluator::LlmEvaluator;
pub use improver::LlmImprover;
pub use parse::{parse_evaluation, parse_improvement};
pub use traits::{Evaluation, Evaluator, Improver, SessionToken};
