//! Error types for the diff crate.

/// Errors that can occur while diffing documents.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// A document could not be serialized for comparison.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A document serialized to something other than a JSON object.
    #[error("unexpected document shape: {0}")]
    UnexpectedShape(String),
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
