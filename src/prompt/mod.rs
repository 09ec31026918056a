//! Prompt System - Template loading and rendering
//!
//! This module provides functionality for loading prompt templates from files
//! (or the built-in set) and rendering them with Handlebars.

mod loader;
mod render;
pub mod templates;

pub use loader::PromptLoader;
pub use render::PromptRenderer;
