use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid analysis id {id:?}: {reason}")]
    InvalidAnalysisId { id: String, reason: String },

    #[error("malformed parameter declaration: {0}")]
    MalformedParameter(String),

    #[error("alias {alias:?} is declared more than once")]
    DuplicateAlias { alias: String },

    #[error("dataset {arn} is declared under both {first:?} and {second:?}")]
    DuplicateDataSet {
        arn: String,
        first: String,
        second: String,
    },

    #[error("alias {alias:?} is referenced but not declared")]
    UnknownAlias { alias: String },
}
