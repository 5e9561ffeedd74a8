//! Display preferences.
//!
//! Currently a single flag: dark mode. It is stored as its own tiny JSON
//! document so the historical `{"isDark":...}` shape stays untouched.
//! Loading falls back to the default on any problem; saving is
//! best-effort and only logged on failure, the in-memory value stays
//! authoritative either way.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::storage::DocumentStore;

/// Document key of the persisted dark mode flag
pub const DARK_MODE_KEY: &str = "dark_mode.json";

/// The persisted display preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DarkModePrefs {
    #[serde(rename = "isDark", default)]
    pub is_dark: bool,
}

impl DarkModePrefs {
    /// Loads the preference, defaulting to light mode when the document
    /// is missing or unreadable.
    pub fn load(store: &dyn DocumentStore) -> Self {
        match store.read_document(DARK_MODE_KEY) {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(prefs) => prefs,
                Err(e) => {
                    warn!("Préférence de thème illisible : {e}");
                    Self::default()
                }
            },
            Ok(None) => Self::default(),
            Err(e) => {
                warn!("Lecture de la préférence de thème impossible : {e}");
                Self::default()
            }
        }
    }

    /// Persists the current value, logging failures instead of
    /// propagating them.
    pub fn save(&self, store: &dyn DocumentStore) {
        match serde_json::to_vec(self) {
            Ok(bytes) => {
                if let Err(e) = store.write_document(DARK_MODE_KEY, &bytes) {
                    warn!("Écriture de la préférence de thème impossible : {e}");
                }
            }
            Err(e) => warn!("Sérialisation de la préférence de thème impossible : {e}"),
        }
    }

    /// Sets the flag and persists it. Returns the new value.
    pub fn set(&mut self, is_dark: bool, store: &dyn DocumentStore) -> bool {
        self.is_dark = is_dark;
        self.save(store);
        debug!("Mode sombre : {}", self.is_dark);
        self.is_dark
    }

    /// Flips the flag and persists it. Returns the new value.
    pub fn toggle(&mut self, store: &dyn DocumentStore) -> bool {
        let next = !self.is_dark;
        self.set(next, store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryDocumentStore;

    #[test]
    fn test_defaults_to_light_mode() {
        let store = MemoryDocumentStore::new();
        let prefs = DarkModePrefs::load(&store);
        assert!(!prefs.is_dark);
    }

    #[test]
    fn test_set_persists_document_shape() {
        let store = MemoryDocumentStore::new();
        let mut prefs = DarkModePrefs::load(&store);
        assert!(prefs.set(true, &store));

        let doc = store.document(DARK_MODE_KEY).unwrap();
        assert_eq!(doc, br#"{"isDark":true}"#.to_vec());
    }

    #[test]
    fn test_toggle_roundtrip() {
        let store = MemoryDocumentStore::new();
        let mut prefs = DarkModePrefs::load(&store);
        assert!(prefs.toggle(&store));
        assert!(!prefs.toggle(&store));

        let reloaded = DarkModePrefs::load(&store);
        assert!(!reloaded.is_dark);
    }

    #[test]
    fn test_survives_write_failure() {
        let store = MemoryDocumentStore::new();
        let mut prefs = DarkModePrefs::load(&store);
        store.set_fail_writes(true);
        // the in-memory value still flips even though the write fails
        assert!(prefs.toggle(&store));
        assert!(prefs.is_dark);
        assert!(store.document(DARK_MODE_KEY).is_none());
    }

    #[test]
    fn test_corrupt_document_falls_back_to_default() {
        let store = MemoryDocumentStore::new();
        store.write_document(DARK_MODE_KEY, b"{broken").unwrap();
        let prefs = DarkModePrefs::load(&store);
        assert!(!prefs.is_dark);
    }
}
