//! Loop state machine and terminal run status.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Phase of a single auto-improve run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    /// Run created, nothing called yet
    #[default]
    NotStarted,
    /// Waiting on the evaluator
    Evaluating,
    /// Waiting on the improver
    Improving,
    /// The initial document already met the target
    TargetMetOriginal,
    /// An improved revision met the target
    TargetReached,
    /// Iteration budget spent below target
    MaxIterationsReached,
}

impl LoopState {
    /// Returns true if the run has finished
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LoopState::TargetMetOriginal | LoopState::TargetReached | LoopState::MaxIterationsReached
        )
    }

    /// Returns true if moving from `self` to `next` is a legal step
    pub fn can_transition_to(&self, next: LoopState) -> bool {
        use LoopState::*;
        matches!(
            (self, next),
            (NotStarted, Evaluating)
                | (Evaluating, Improving)
                | (Evaluating, TargetMetOriginal)
                | (Evaluating, TargetReached)
                | (Evaluating, MaxIterationsReached)
                | (Improving, Evaluating)
        )
    }

    /// Terminal status for a finished run, None while it is still going
    pub fn status(&self) -> Option<RunStatus> {
        match self {
            LoopState::TargetMetOriginal => Some(RunStatus::TargetMetOriginal),
            LoopState::TargetReached => Some(RunStatus::TargetReached),
            LoopState::MaxIterationsReached => Some(RunStatus::MaxIterationsReached),
            _ => None,
        }
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoopState::NotStarted => "not_started",
            LoopState::Evaluating => "evaluating",
            LoopState::Improving => "improving",
            LoopState::TargetMetOriginal => "target_met_original",
            LoopState::TargetReached => "target_reached",
            LoopState::MaxIterationsReached => "max_iterations_reached",
        };
        f.write_str(s)
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    TargetMetOriginal,
    TargetReached,
    MaxIterationsReached,
}

impl RunStatus {
    /// Returns true if the run ended at or above target
    pub fn met_target(&self) -> bool {
        matches!(self, RunStatus::TargetMetOriginal | RunStatus::TargetReached)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::TargetMetOriginal => "target_met_original",
            RunStatus::TargetReached => "target_reached",
            RunStatus::MaxIterationsReached => "max_iterations_reached",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!LoopState::NotStarted.is_terminal());
        assert!(!LoopState::Evaluating.is_terminal());
        assert!(!LoopState::Improving.is_terminal());
        assert!(LoopState::TargetMetOriginal.is_terminal());
        assert!(LoopState::TargetReached.is_terminal());
        assert!(LoopState::MaxIterationsReached.is_terminal());
    }

    #[test]
    fn test_legal_transitions() {
        assert!(LoopState::NotStarted.can_transition_to(LoopState::Evaluating));
        assert!(LoopState::Evaluating.can_transition_to(LoopState::Improving));
        assert!(LoopState::Improving.can_transition_to(LoopState::Evaluating));
        assert!(LoopState::Evaluating.can_transition_to(LoopState::TargetReached));
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!LoopState::NotStarted.can_transition_to(LoopState::Improving));
        assert!(!LoopState::Improving.can_transition_to(LoopState::TargetReached));
        assert!(!LoopState::TargetReached.can_transition_to(LoopState::Evaluating));
        assert!(!LoopState::MaxIterationsReached.can_transition_to(LoopState::Improving));
    }

    #[test]
    fn test_status_only_for_terminal_states() {
        assert_eq!(LoopState::Evaluating.status(), None);
        assert_eq!(LoopState::TargetReached.status(), Some(RunStatus::TargetReached));
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&RunStatus::MaxIterationsReached).unwrap();
        assert_eq!(json, "\"max_iterations_reached\"");
        assert_eq!(RunStatus::TargetMetOriginal.to_string(), "target_met_original");
        assert_eq!(LoopState::NotStarted.to_string(), "not_started");
    }

    #[test]
    fn test_met_target() {
        assert!(RunStatus::TargetMetOriginal.met_target());
        assert!(RunStatus::TargetReached.met_target());
        assert!(!RunStatus::MaxIterationsReached.met_target());
    }
}
