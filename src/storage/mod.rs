//! Document and payload persistence.
//!
//! The daemon persists two kinds of data: small JSON documents (custom
//! sound catalog, dark mode preference) and opaque audio payloads copied
//! in when the user imports a sound. Both live under a single data
//! directory. The [`DocumentStore`] trait abstracts that directory so
//! daemon logic can be tested against an in-memory store.
//!
//! A missing document is not an error; it reads as `None` and callers
//! fall back to their defaults.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use thiserror::Error;
use tracing::debug;

/// Errors raised by the persistence layer.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Échec de lecture de {path} : {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Échec d'écriture de {path} : {source}")]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Échec de suppression de {path} : {source}")]
    Delete {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The relative path would escape the data directory.
    #[error("Chemin invalide : {0}")]
    InvalidPath(String),
}

/// Abstraction over the data directory.
///
/// Documents are small JSON files addressed by bare file names; payloads
/// are arbitrary bytes addressed by a path relative to the data
/// directory (e.g. `sounds/custom-17.mp3`).
pub trait DocumentStore: Send + Sync {
    /// Reads a document, `Ok(None)` when it does not exist.
    fn read_document(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Writes a document, replacing any previous content.
    fn write_document(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Writes an audio payload at the given relative path, creating
    /// intermediate directories as needed.
    fn store_payload(&self, relative_path: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Deletes a payload or document; deleting something absent is fine.
    fn delete_resource(&self, relative_path: &str) -> Result<(), StorageError>;
}

// ============================================================================
// Filesystem store
// ============================================================================

/// Store backed by a directory on disk.
#[derive(Debug)]
pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    /// Opens (and creates if needed) the store rooted at `root`.
    pub fn new(root: PathBuf) -> Result<Self, StorageError> {
        fs::create_dir_all(&root).map_err(|e| StorageError::Write {
            path: root.display().to_string(),
            source: e,
        })?;
        debug!("Répertoire de données : {}", root.display());
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a relative path under the root, refusing anything that
    /// could point outside of it. Relative paths come from persisted
    /// documents, which the user can edit by hand.
    fn resolve(&self, relative_path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(relative_path);
        let escapes = relative.components().any(|component| {
            !matches!(component, Component::Normal(_) | Component::CurDir)
        });
        if relative_path.is_empty() || escapes {
            return Err(StorageError::InvalidPath(relative_path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl DocumentStore for FsDocumentStore {
    fn read_document(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.resolve(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Read {
                path: path.display().to_string(),
                source: e,
            }),
        }
    }

    fn write_document(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.resolve(key)?;
        fs::write(&path, bytes).map_err(|e| StorageError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }

    fn store_payload(&self, relative_path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.resolve(relative_path)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        fs::write(&path, bytes).map_err(|e| StorageError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }

    fn delete_resource(&self, relative_path: &str) -> Result<(), StorageError> {
        let path = self.resolve(relative_path)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Delete {
                path: path.display().to_string(),
                source: e,
            }),
        }
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// In-memory store for testing.
///
/// `set_fail_writes(true)` makes every mutation fail, which is how tests
/// exercise the "persistence broke but the session must go on" paths.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: Mutex<HashMap<String, Vec<u8>>>,
    payloads: Mutex<HashMap<String, Vec<u8>>>,
    fail_writes: AtomicBool,
}

impl MemoryDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn document(&self, key: &str) -> Option<Vec<u8>> {
        self.documents.lock().unwrap().get(key).cloned()
    }

    #[must_use]
    pub fn payload(&self, relative_path: &str) -> Option<Vec<u8>> {
        self.payloads.lock().unwrap().get(relative_path).cloned()
    }

    fn simulated_failure(path: &str) -> StorageError {
        StorageError::Write {
            path: path.to_string(),
            source: io::Error::other("échec simulé"),
        }
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn read_document(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.documents.lock().unwrap().get(key).cloned())
    }

    fn write_document(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::simulated_failure(key));
        }
        self.documents
            .lock()
            .unwrap()
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn store_payload(&self, relative_path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::simulated_failure(relative_path));
        }
        self.payloads
            .lock()
            .unwrap()
            .insert(relative_path.to_string(), bytes.to_vec());
        Ok(())
    }

    fn delete_resource(&self, relative_path: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::simulated_failure(relative_path));
        }
        self.payloads.lock().unwrap().remove(relative_path);
        self.documents.lock().unwrap().remove(relative_path);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
