use thiserror::Error;

/// Input errors surfaced at the engine boundary.
///
/// These short-circuit before any analyzer runs. Analyzer weakness is never
/// an error: a degraded analysis surfaces as low confidence instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("progression is empty")]
    EmptyProgression,
    #[error("unparsable chord '{symbol}' at position {position}")]
    UnparsableChord { symbol: String, position: usize },
    #[error("unparsable note '{token}' at position {position}")]
    UnparsableNote { token: String, position: usize },
    #[error("invalid key: {0}")]
    InvalidKey(String),
    /// An internal invariant was violated mid-pipeline. Only fires in the
    /// presence of a bug.
    #[error("internal inconsistency: {0}")]
    Inconsistency(String),
}
