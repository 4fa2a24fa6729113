//! Error types for the merge crate.

use std::fmt;

use defmerge_store::StoreError;
use defmerge_types::TypeError;

/// Which side of a merge a document played.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentRole {
    /// The document being merged into.
    Target,
    /// The document whose declarations are being brought in.
    Incoming,
    /// The result of the merge.
    Merged,
}

impl fmt::Display for DocumentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentRole::Target => f.write_str("target"),
            DocumentRole::Incoming => f.write_str("incoming"),
            DocumentRole::Merged => f.write_str("merged"),
        }
    }
}

/// Errors that abort a merge.
///
/// Every variant is fatal for the invocation and is raised before any write
/// reaches the document store.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// Both documents declare a parameter with this name but different content.
    #[error("Parameter: {name} exists in both the analyses, change the name of the parameter in one of the analyses and retry")]
    DuplicateParameterName { name: String },

    /// Both documents define a calculated field with this name on the same
    /// dataset alias (after alias rewriting) but with different content.
    #[error("Calculated field: {name} exists in both the analyses on dataset {data_set_identifier}, change the name of the calculated field in one of the analyses and retry")]
    DuplicateCalculatedFieldName {
        name: String,
        data_set_identifier: String,
    },

    /// No free alias could be found for a clashing dataset alias.
    #[error("cannot find a free alias for {alias:?} after {attempts} attempts")]
    UnresolvableAliasCollision { alias: String, attempts: usize },

    /// A document violates the one-alias-per-dataset invariant.
    #[error("invalid {role} document: {source}")]
    InvalidDocument {
        role: DocumentRole,
        #[source]
        source: TypeError,
    },

    /// The document store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl MergeError {
    /// Returns `true` for conflicts the caller resolves by editing an input.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            MergeError::DuplicateParameterName { .. }
                | MergeError::DuplicateCalculatedFieldName { .. }
                | MergeError::UnresolvableAliasCollision { .. }
        )
    }
}

/// Convenience alias for merge results.
pub type MergeResult<T> = Result<T, MergeError>;
