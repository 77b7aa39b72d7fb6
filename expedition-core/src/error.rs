//! Error and outcome types for the expedition engine.
//!
//! Configuration problems are real errors ([`EngineError`]). Gameplay input
//! never is: every mutating gameplay operation reports an [`Outcome`] so the
//! caller can log or ignore it without unwinding.

use thiserror::Error;

use crate::types::{MissionId, RunId};

/// Top-level error type for fallible engine operations.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A mission definition failed validation.
    #[error("Invalid mission definition '{mission}': {reason}")]
    InvalidMission {
        /// Which mission was rejected.
        mission: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Why a gameplay operation was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The operation is not legal in the machine's current state.
    #[error("{operation} is not valid while {state:?}")]
    WrongState {
        /// Operation that was attempted.
        operation: &'static str,
        /// State the machine was in.
        state: crate::mission::MissionState,
    },
    /// Puzzle type is not part of the mission definition.
    #[error("puzzle '{0}' is not registered")]
    UnregisteredPuzzle(String),
    /// Zone id is not part of the mission definition.
    #[error("zone '{0}' is not part of this mission")]
    UnknownZone(String),
    /// A mission is already running.
    #[error("a mission is already in progress")]
    MissionInProgress,
    /// No mission is running.
    #[error("no mission in progress")]
    NoMissionInProgress,
    /// The mission id is not in the catalog.
    #[error("unknown mission '{0}'")]
    UnknownMission(MissionId),
    /// The snapshot does not belong to the active run.
    #[error("snapshot from run {actual} does not match active run {expected}")]
    RunMismatch {
        /// Run the hub is tracking.
        expected: RunId,
        /// Run the snapshot came from.
        actual: RunId,
    },
    /// The active run has not produced its results yet.
    #[error("mission results are not ready")]
    ResultsNotReady,
}

/// Result of a gameplay operation.
///
/// Mirrors the error taxonomy of the engine: an operation either takes
/// effect, is recognised as a repeat of something already applied, or is
/// refused because it arrived out of order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "outcomes report whether the operation took effect"]
pub enum Outcome {
    /// The operation changed state.
    Applied,
    /// The operation repeated an event that was already applied.
    Duplicate,
    /// The operation was refused and nothing changed.
    Rejected(Rejection),
}

impl Outcome {
    /// Whether the operation changed state.
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }

    /// The rejection reason, if any.
    #[must_use]
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Rejected(r) => Some(r),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mission::MissionState;
    use std::error::Error as _;

    #[test]
    fn rejection_messages_name_the_offender() {
        let wrong = Rejection::WrongState {
            operation: "recover_artifact",
            state: MissionState::Exploring,
        };
        assert_eq!(wrong.to_string(), "recover_artifact is not valid while Exploring");
        assert_eq!(
            Rejection::UnregisteredPuzzle("orrery".into()).to_string(),
            "puzzle 'orrery' is not registered"
        );
        assert_eq!(
            Rejection::UnknownMission(MissionId::from("nowhere")).to_string(),
            "unknown mission 'nowhere'"
        );
    }

    #[test]
    fn rejection_is_a_std_error() {
        fn boxed(r: Rejection) -> Box<dyn std::error::Error> {
            Box::new(r)
        }
        let err = boxed(Rejection::NoMissionInProgress);
        assert_eq!(err.to_string(), "no mission in progress");
        assert!(err.source().is_none());
    }
}
