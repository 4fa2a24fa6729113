//! Directory-backed document store.
//!
//! Each document lives in `<root>/<id>.json` as pretty-printed JSON in the
//! store's native shape, with the publish-time grants under `Permissions`.
//! A file exported straight from the remote store (no `AnalysisId`, no
//! `Permissions`) is also readable; its identifier is taken from the file name.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use defmerge_types::{AnalysisDocument, AnalysisId, ResourcePermission};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::request::{PublishRequest, UpdateRequest};
use crate::traits::DocumentStore;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DocumentFile {
    #[serde(flatten)]
    document: AnalysisDocument,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    permissions: Vec<ResourcePermission>,
}

/// A document store persisting one JSON file per document.
///
/// Writes go to a temporary file in the same directory which is then renamed
/// over the destination, so readers never observe a half-written document.
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Path of the file holding `id`.
    pub fn path_for(&self, id: &AnalysisId) -> PathBuf {
        self.root.join(format!("{id}.json"))
    }

    /// Identifiers of every document in the store, sorted.
    pub fn list(&self) -> StoreResult<Vec<AnalysisId>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    match AnalysisId::parse(stem) {
                        Ok(id) => ids.push(id),
                        Err(e) => tracing::warn!("skipping {:?}: {}", path, e),
                    }
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Permissions recorded when `id` was published.
    pub fn permissions(&self, id: &AnalysisId) -> StoreResult<Vec<ResourcePermission>> {
        Ok(self.read_file(id)?.permissions)
    }

    fn read_file(&self, id: &AnalysisId) -> StoreResult<DocumentFile> {
        let path = self.path_for(id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id.clone()))
            }
            Err(e) => return Err(e.into()),
        };
        let mut file: DocumentFile = serde_json::from_slice(&bytes)?;
        if file.document.analysis_id.is_none() {
            file.document.analysis_id = Some(id.clone());
        }
        Ok(file)
    }

    fn write_file(&self, id: &AnalysisId, file: &DocumentFile) -> StoreResult<()> {
        let json = serde_json::to_vec_pretty(file)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.path_for(id)).map_err(|e| e.error)?;
        Ok(())
    }
}

impl DocumentStore for FsDocumentStore {
    fn fetch(&self, id: &AnalysisId) -> StoreResult<AnalysisDocument> {
        Ok(self.read_file(id)?.document)
    }

    fn publish(&self, request: &PublishRequest) -> StoreResult<()> {
        if self.path_for(&request.id).exists() {
            return Err(StoreError::AlreadyExists(request.id.clone()));
        }
        let file = DocumentFile {
            document: request.to_document(),
            permissions: request.permissions.clone(),
        };
        self.write_file(&request.id, &file)?;
        debug!(id = %request.id, path = %self.path_for(&request.id).display(), "document published");
        Ok(())
    }

    fn update(&self, request: &UpdateRequest) -> StoreResult<()> {
        let existing = self.read_file(&request.id)?;
        let file = DocumentFile {
            document: request.to_document(),
            permissions: existing.permissions,
        };
        self.write_file(&request.id, &file)?;
        debug!(id = %request.id, "document updated");
        Ok(())
    }

    fn delete(&self, id: &AnalysisId) -> StoreResult<bool> {
        match fs::remove_file(self.path_for(id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self, id: &AnalysisId) -> StoreResult<bool> {
        Ok(self.path_for(id).is_file())
    }
}
