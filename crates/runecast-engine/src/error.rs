use thiserror::Error;

use crate::state::Phase;

/// Errors from turn-machine operations invoked out of order.
///
/// None of these are fatal to a session: the caller logs and carries
/// on with the state unchanged.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("{op} is not valid during the {phase} phase")]
    WrongPhase { op: &'static str, phase: Phase },

    #[error("expected {expected} dice in a roll, got {got}")]
    BadRoll { expected: usize, got: usize },

    #[error("no die at index {index}")]
    NoSuchDie { index: usize },

    #[error("selection already locked in for this round")]
    SelectionLocked,

    #[error("the match is already decided")]
    MatchOver,
}
