//! Error type shared by the store, the sessions and the shell.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuizError {
    /// A command that works on one quiz was given no index.
    #[error("missing the id parameter")]
    MissingParameter,

    /// The parameter is not a non-negative integer.
    #[error("invalid id '{0}'")]
    InvalidIndex(String),

    /// The index does not resolve in the store.
    #[error("there is no quiz with id {0}")]
    NotFound(usize),

    #[error("unknown command '{0}', type 'help' to see the commands")]
    UnknownCommand(String),

    #[error("the {0} must not be empty")]
    EmptyField(&'static str),

    /// Input ended while waiting for a line.
    #[error("input closed")]
    InputClosed,

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl QuizError {
    /// True for conditions that abort only the current command.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, QuizError::InputClosed)
    }
}

pub type Result<T> = std::result::Result<T, QuizError>;
