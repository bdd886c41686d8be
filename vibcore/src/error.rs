use thiserror::Error;

/// Error type shared by the core engine and its collaborators.
///
/// `FileNotFound` and `UnsupportedFormat` are reserved for loader
/// collaborators; the core itself never raises them. All core validation
/// happens eagerly at the start of an operation, so a returned error
/// guarantees no partial mutation took place.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VibError {
    #[error("file not found: {0}")]
    FileNotFound(String),
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("out of bounds: {0}")]
    OutOfBounds(String),
    #[error("invalid state transition: {0}")]
    InvalidStateTransition(String),
    #[error("missing derived state: {0}")]
    MissingDerivedState(String),
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),
}
