//! Error types for the detection pipeline.

use thiserror::Error;

/// Result type alias using [`DetectError`].
pub type Result<T> = std::result::Result<T, DetectError>;

/// Errors surfaced by the detection pipeline.
///
/// Bounded-enumeration truncation and PageRank non-convergence are not
/// errors: they are tolerated and reflected in the result summary.
#[derive(Debug, Error)]
pub enum DetectError {
    /// A transaction record failed validation. The whole batch is rejected.
    #[error("invalid input: {0}")]
    InputInvalid(String),

    /// The batch produced no edges after aggregation.
    #[error("empty input: no transactions to analyze")]
    EmptyInput,

    /// The caller cancelled the run between pipeline stages.
    #[error("pipeline cancelled")]
    Cancelled,

    /// A precondition was violated inside the pipeline.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DetectError {
    /// Create an input validation error.
    #[must_use]
    pub fn input(msg: impl Into<String>) -> Self {
        DetectError::InputInvalid(msg.into())
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        DetectError::Internal(msg.into())
    }

    /// Machine-readable error kind, stable for embedding services that map
    /// errors onto transport-level responses.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            DetectError::InputInvalid(_) => "input_invalid",
            DetectError::EmptyInput => "empty_input",
            DetectError::Cancelled => "cancelled",
            DetectError::Internal(_) => "internal",
        }
    }

    /// Returns true when the error was caused by the caller's input rather
    /// than a pipeline defect.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DetectError::InputInvalid(_) | DetectError::EmptyInput | DetectError::Cancelled
        )
    }
}
