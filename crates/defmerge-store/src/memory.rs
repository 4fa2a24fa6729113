use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use defmerge_types::{AnalysisDocument, AnalysisId, ResourcePermission};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::request::{PublishRequest, UpdateRequest};
use crate::traits::DocumentStore;

#[derive(Clone, Debug)]
struct StoredDocument {
    document: AnalysisDocument,
    permissions: Vec<ResourcePermission>,
}

/// In-memory, HashMap-based document store.
///
/// Intended for tests and embedding. Documents are held behind a `RwLock`
/// and cloned on read and write. Every call to `publish`, `update` or
/// `delete` bumps a mutation counter, whether or not it changed anything,
/// so tests can assert that a failed merge never reached the store.
pub struct InMemoryDocumentStore {
    documents: RwLock<HashMap<AnalysisId, StoredDocument>>,
    mutations: AtomicUsize,
}

impl InMemoryDocumentStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            mutations: AtomicUsize::new(0),
        }
    }

    /// Seed a document without counting it as a mutation.
    ///
    /// The document's own `analysis_id` is ignored in favour of `id`.
    pub fn insert(&self, id: AnalysisId, mut document: AnalysisDocument) {
        document.analysis_id = Some(id.clone());
        self.documents.write().expect("lock poisoned").insert(
            id,
            StoredDocument {
                document,
                permissions: Vec::new(),
            },
        );
    }

    /// Number of documents currently stored.
    pub fn len(&self) -> usize {
        self.documents.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.documents.read().expect("lock poisoned").is_empty()
    }

    /// Number of publish, update and delete calls received so far.
    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    /// Permissions granted when `id` was published.
    pub fn permissions(&self, id: &AnalysisId) -> Option<Vec<ResourcePermission>> {
        let map = self.documents.read().expect("lock poisoned");
        map.get(id).map(|stored| stored.permissions.clone())
    }

    fn record_mutation(&self) {
        self.mutations.fetch_add(1, Ordering::SeqCst);
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn fetch(&self, id: &AnalysisId) -> StoreResult<AnalysisDocument> {
        let map = self.documents.read().expect("lock poisoned");
        map.get(id)
            .map(|stored| stored.document.clone())
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    fn publish(&self, request: &PublishRequest) -> StoreResult<()> {
        self.record_mutation();
        let mut map = self.documents.write().expect("lock poisoned");
        if map.contains_key(&request.id) {
            return Err(StoreError::AlreadyExists(request.id.clone()));
        }
        map.insert(
            request.id.clone(),
            StoredDocument {
                document: request.to_document(),
                permissions: request.permissions.clone(),
            },
        );
        debug!(id = %request.id, "document published");
        Ok(())
    }

    fn update(&self, request: &UpdateRequest) -> StoreResult<()> {
        self.record_mutation();
        let mut map = self.documents.write().expect("lock poisoned");
        let stored = map
            .get_mut(&request.id)
            .ok_or_else(|| StoreError::NotFound(request.id.clone()))?;
        stored.document = request.to_document();
        debug!(id = %request.id, "document updated");
        Ok(())
    }

    fn delete(&self, id: &AnalysisId) -> StoreResult<bool> {
        self.record_mutation();
        let mut map = self.documents.write().expect("lock poisoned");
        Ok(map.remove(id).is_some())
    }
}

impl std::fmt::Debug for InMemoryDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryDocumentStore")
            .field("document_count", &self.len())
            .field("mutations", &self.mutation_count())
            .finish()
    }
}
