//! File selection surface for sound imports.
//!
//! The daemon never touches the user's files directly; it asks a
//! [`FilePicker`] for a name plus the full file content. The production
//! picker reads a path received over IPC, the mock hands back canned
//! data. A pick that yields nothing (missing file, unreadable file) is
//! not an error: the import is simply abandoned and logged.

use std::fs;
use std::path::PathBuf;

use tracing::warn;

/// A file the user picked, fully read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickedFile {
    /// Original file name, used to derive the catalog label
    pub name: String,
    /// Raw audio payload
    pub bytes: Vec<u8>,
}

/// Trait for supplying the file behind an import request.
pub trait FilePicker {
    /// Returns the picked file, or None when the user cancelled or the
    /// file could not be supplied.
    fn pick(&self) -> Option<PickedFile>;
}

// ============================================================================
// PathPicker
// ============================================================================

/// Picker that reads a concrete path from the local filesystem.
#[derive(Debug, Clone)]
pub struct PathPicker {
    path: PathBuf,
}

impl PathPicker {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FilePicker for PathPicker {
    fn pick(&self) -> Option<PickedFile> {
        let name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())?;
        match fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => {
                warn!("Fichier vide ignoré : {}", self.path.display());
                None
            }
            Ok(bytes) => Some(PickedFile { name, bytes }),
            Err(e) => {
                warn!("Lecture de {} impossible : {e}", self.path.display());
                None
            }
        }
    }
}

// ============================================================================
// MockFilePicker
// ============================================================================

/// Mock picker for testing.
#[derive(Debug, Default)]
pub struct MockFilePicker {
    file: Option<PickedFile>,
}

impl MockFilePicker {
    /// Picker that always hands back the given file.
    #[must_use]
    pub fn with_file(file: PickedFile) -> Self {
        Self { file: Some(file) }
    }

    /// Picker that behaves like a cancelled dialog.
    #[must_use]
    pub fn empty() -> Self {
        Self { file: None }
    }
}

impl FilePicker for MockFilePicker {
    fn pick(&self) -> Option<PickedFile> {
        self.file.clone()
    }
}
