/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised by the shared data model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// A variable read as a number holds something that is not an integer.
    #[error("variable \"{key}\" holds \"{value}\", which is not an integer")]
    NotANumber {
        /// The variable key.
        key: String,
        /// The stored text.
        value: String,
    },

    /// A duration string could not be parsed.
    #[error("invalid duration: \"{0}\"")]
    InvalidDuration(String),

    /// A stat name is not part of the catalog.
    #[error("unknown stat: \"{0}\"")]
    UnknownStat(String),

    /// A stat exists but cannot be assigned.
    #[error("stat \"{0}\" is read-only")]
    ReadOnlyStat(String),

    /// A variable meant to hold a position holds something else.
    #[error("invalid position: \"{0}\"")]
    InvalidPosition(String),
}
