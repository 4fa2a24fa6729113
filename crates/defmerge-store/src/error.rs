use defmerge_types::AnalysisId;

/// Errors from document store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested document was not found.
    #[error("document not found: {0}")]
    NotFound(AnalysisId),

    /// A document with this identifier already exists.
    #[error("document already exists: {0}")]
    AlreadyExists(AnalysisId),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A document on disk does not carry a usable identifier.
    #[error("invalid document id: {0}")]
    InvalidId(#[from] defmerge_types::TypeError),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
