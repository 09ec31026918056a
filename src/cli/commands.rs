//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - grade: evaluate a document once
//! - improve: evaluate then revise a document once
//! - auto-improve: run the improve loop until the target score
//! - runs: list recorded auto-improve runs

use autodoc::improve::ScoreScale;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Autodoc - grade and iteratively improve documents with LLM agents
#[derive(Parser, Debug)]
#[command(name = "autodoc")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output directory for artifacts and run records
    #[arg(short, long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Score scale: unit (0-1) or percent (0-100)
    #[arg(long, global = true)]
    pub scale: Option<ScoreScale>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate a document and print its score and feedback
    Grade {
        /// Document to grade
        document: PathBuf,

        /// Session token passed through to the agents
        #[arg(short, long)]
        session_id: Option<String>,
    },

    /// Evaluate a document and revise it once
    Improve {
        /// Document to improve
        document: PathBuf,

        /// Session token passed through to the agents
        #[arg(short, long)]
        session_id: Option<String>,
    },

    /// Improve a document repeatedly until it reaches the target score
    AutoImprove {
        /// Document to improve
        document: PathBuf,

        /// Maximum number of improvement iterations
        #[arg(short = 'n', long)]
        iterations: Option<u32>,

        /// Score at which to stop
        #[arg(short, long)]
        target: Option<f64>,

        /// Session token passed through to the agents
        #[arg(short, long)]
        session_id: Option<String>,
    },

    /// List recorded auto-improve runs
    Runs {
        /// Only show runs for this document id
        #[arg(short, long)]
        document: Option<String>,
    },
}
