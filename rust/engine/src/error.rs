// rust/engine/src/error.rs
#![forbid(unsafe_code)]

use thiserror::Error;

use crate::engine::State;

/// Errors surfaced by the maze environments and learners.
///
/// All variants are configuration or usage errors; nothing in the crate retries them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MazeError {
    /// Malformed confusion weights, action distributions or learning parameters.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// `reset` could not resolve an initial state.
    #[error("unable to reset the environment: {reason}")]
    ResetImpossible { reason: String },

    /// `step` was called before `reset`, or after the episode finished.
    #[error("episode terminated or not started; call reset() first")]
    NeedsReset,

    #[error("state {state} is not a free cell of this maze")]
    UnknownState { state: State },

    #[error("unknown map symbol {ch:?} at row {row}, column {col}")]
    MapParse { row: usize, col: usize, ch: char },

    #[error("multiple start squares are prohibited: {first} and {second}")]
    MultipleStarts { first: State, second: State },
}

impl MazeError {
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn reset_impossible<S: Into<String>>(reason: S) -> Self {
        Self::ResetImpossible {
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION",
            Self::ResetImpossible { .. } => "RESET_IMPOSSIBLE",
            Self::NeedsReset => "NEEDS_RESET",
            Self::UnknownState { .. } => "UNKNOWN_STATE",
            Self::MapParse { .. } => "MAP_PARSE",
            Self::MultipleStarts { .. } => "MULTIPLE_STARTS",
        }
    }
}
