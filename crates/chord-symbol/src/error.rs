use thiserror::Error;

/// Errors produced while parsing chord symbols, notes, and key names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty chord symbol")]
    EmptyInput,
    #[error("unrecognized chord symbol: {0}")]
    InvalidChord(String),
    #[error("unrecognized note: {0}")]
    InvalidNote(String),
    #[error("unrecognized key: {0}")]
    InvalidKey(String),
}
