//! Error types for hypothesis identifiers and enum parsing.

use thiserror::Error;

/// Errors raised while parsing research identifiers and enum values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    /// Hypothesis id does not match `H-<SESSION>-<SEQ>`.
    #[error("malformed hypothesis id: {0:?}")]
    MalformedHypothesisId(String),

    /// Session id is empty, contains characters outside `[A-Za-z0-9_-]`, or
    /// starts or ends with `-`.
    #[error("malformed session id: {0:?}")]
    MalformedSessionId(String),

    /// A string did not name any variant of the given enum.
    #[error("unknown {kind}: {value:?}")]
    UnknownVariant { kind: &'static str, value: String },
}

/// Result type for identifier and enum parsing.
pub type TypesResult<T> = Result<T, TypesError>;
