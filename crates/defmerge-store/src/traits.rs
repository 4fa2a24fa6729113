use defmerge_types::{AnalysisDocument, AnalysisId};

use crate::error::{StoreError, StoreResult};
use crate::request::{PublishRequest, UpdateRequest};

/// Storage backend for analysis documents.
///
/// All implementations must satisfy these invariants:
/// - `publish` never overwrites an existing document.
/// - `update` never creates a missing document.
/// - `delete` of a missing document is not an error.
/// - All I/O errors are propagated, never silently ignored or retried.
pub trait DocumentStore: Send + Sync {
    /// Read a document by identifier.
    ///
    /// Returns `Err(StoreError::NotFound)` if the document does not exist.
    fn fetch(&self, id: &AnalysisId) -> StoreResult<AnalysisDocument>;

    /// Create a new document.
    ///
    /// Returns `Err(StoreError::AlreadyExists)` if the identifier is taken.
    fn publish(&self, request: &PublishRequest) -> StoreResult<()>;

    /// Replace the name, definition and theme of an existing document.
    ///
    /// Permissions granted at publish time are left untouched.
    fn update(&self, request: &UpdateRequest) -> StoreResult<()>;

    /// Delete a document. Returns `true` if the document existed.
    fn delete(&self, id: &AnalysisId) -> StoreResult<bool>;

    /// Check whether a document exists.
    ///
    /// Default implementation calls `fetch()` and maps `NotFound` to `false`.
    fn exists(&self, id: &AnalysisId) -> StoreResult<bool> {
        match self.fetch(id) {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

impl<T: DocumentStore + ?Sized> DocumentStore for &T {
    fn fetch(&self, id: &AnalysisId) -> StoreResult<AnalysisDocument> {
        (**self).fetch(id)
    }

    fn publish(&self, request: &PublishRequest) -> StoreResult<()> {
        (**self).publish(request)
    }

    fn update(&self, request: &UpdateRequest) -> StoreResult<()> {
        (**self).update(request)
    }

    fn delete(&self, id: &AnalysisId) -> StoreResult<bool> {
        (**self).delete(id)
    }

    fn exists(&self, id: &AnalysisId) -> StoreResult<bool> {
        (**self).exists(id)
    }
}
