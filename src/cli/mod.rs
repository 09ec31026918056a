//! CLI module for autodoc - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for grading and improving
//! documents.

pub mod commands;

pub use commands::Cli;
