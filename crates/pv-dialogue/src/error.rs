//! Error types for the conversation engine.

use pv_core::CoreError;
use thiserror::Error;

/// Result type for dialogue operations.
pub type DialogueResult<T> = Result<T, DialogueError>;

/// Errors that can occur while evaluating or running a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DialogueError {
    /// A value read from a variable store could not be coerced.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Integer division or remainder by zero.
    #[error("division by zero in {0}")]
    DivisionByZero(&'static str),

    /// A shift amount outside the width of the integer.
    #[error("shift by {0} is out of range")]
    ShiftOutOfRange(i64),

    /// No topic with this id exists, built-in or loaded.
    #[error("topic not found: {0}")]
    TopicNotFound(String),

    /// A registry is already installed.
    #[error("a topic registry is already loaded")]
    RegistryAlreadyLoaded,

    /// No registry is installed.
    #[error("no topic registry is loaded")]
    RegistryNotLoaded,

    /// A chosen response index is out of range.
    #[error("invalid response index {index}, only {len} responses")]
    InvalidResponse {
        /// The index chosen.
        index: usize,
        /// The number of responses offered.
        len: usize,
    },

    /// An effect-on-condition id is not known.
    #[error("unknown effect_on_condition: {0}")]
    UnknownEoc(String),

    /// A conversation was started with neither speaker bound.
    #[error("a dialogue needs at least one speaker")]
    NoSpeakers,
}
