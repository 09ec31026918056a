//! Run settings for the auto-improve loop.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AutodocError, Result};

/// Default iteration cap
pub const DEFAULT_MAX_ITERATIONS: u32 = 3;

/// Default target on the unit scale
pub const DEFAULT_TARGET_SCORE: f64 = 0.7;

/// Numeric scale the evaluator scores on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreScale {
    /// 0.0 ..= 1.0
    #[default]
    Unit,
    /// 0 ..= 100
    Percent,
}

impl ScoreScale {
    pub fn min(&self) -> f64 {
        0.0
    }

    pub fn max(&self) -> f64 {
        match self {
            ScoreScale::Unit => 1.0,
            ScoreScale::Percent => 100.0,
        }
    }

    /// Default target on this scale
    pub fn default_target(&self) -> f64 {
        DEFAULT_TARGET_SCORE * self.max()
    }

    /// Bounds as shown to the evaluator in its prompt
    pub fn bounds_label(&self) -> (&'static str, &'static str) {
        match self {
            ScoreScale::Unit => ("0.0", "1.0"),
            ScoreScale::Percent => ("0", "100"),
        }
    }

    /// True when `score` is finite and inside the scale
    pub fn contains(&self, score: f64) -> bool {
        score.is_finite() && score >= self.min() && score <= self.max()
    }

    /// Format a score as a percentage, e.g. `0.7` on the unit scale is `70.0%`
    pub fn format(&self, score: f64) -> String {
        format!("{:.1}%", self.as_percent(score))
    }

    /// Format a score difference with an explicit sign
    pub fn format_delta(&self, delta: f64) -> String {
        format!("{:+.1}%", self.as_percent(delta))
    }

    fn as_percent(&self, value: f64) -> f64 {
        match self {
            ScoreScale::Unit => value * 100.0,
            ScoreScale::Percent => value,
        }
    }
}

impl fmt::Display for ScoreScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreScale::Unit => f.write_str("unit"),
            ScoreScale::Percent => f.write_str("percent"),
        }
    }
}

impl FromStr for ScoreScale {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unit" | "1" => Ok(ScoreScale::Unit),
            "percent" | "100" => Ok(ScoreScale::Percent),
            other => Err(format!("unknown score scale '{}' (expected unit or percent)", other)),
        }
    }
}

/// Parameters of one auto-improve run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSettings {
    /// Maximum number of improve/evaluate rounds, at least 1
    pub max_iterations: u32,
    /// Score at or above which the run stops
    pub target_score: f64,
    /// Scale both scores and target are expressed on
    pub scale: ScoreScale,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            target_score: DEFAULT_TARGET_SCORE,
            scale: ScoreScale::Unit,
        }
    }
}

impl RunSettings {
    pub fn new(max_iterations: u32, target_score: f64, scale: ScoreScale) -> Self {
        Self {
            max_iterations,
            target_score,
            scale,
        }
    }

    /// Reject settings the loop cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations < 1 {
            return Err(AutodocError::Configuration(format!(
                "max_iterations must be at least 1, got {}",
                self.max_iterations
            )));
        }

        if !self.scale.contains(self.target_score) {
            return Err(AutodocError::Configuration(format!(
                "target_score {} is outside the {} scale ({}..={})",
                self.target_score,
                self.scale,
                self.scale.min(),
                self.scale.max()
            )));
        }

        Ok(())
    }
}
