//! Sound catalogs and the custom sound library.
//!
//! The ambient catalog is the union of a fixed built-in list and the
//! user's custom sounds; the gong catalog is fixed. Custom sounds and
//! their audio payloads are persisted through a [`DocumentStore`], and
//! every path stored in the catalog is relative to the data directory so
//! the document survives a move of that directory.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info, warn};

use crate::picker::FilePicker;
use crate::sound::embedded::embedded_gong;
use crate::sound::AudioTrack;
use crate::storage::DocumentStore;
use crate::types::{GongOption, SoundOption, SILENCE_SOUND_ID};

/// Document key of the persisted custom sound catalog
pub const CUSTOM_SOUNDS_KEY: &str = "custom_sounds.json";

/// Subdirectory of the data directory holding imported audio payloads
pub const SOUNDS_SUBDIR: &str = "sounds";

/// Catalog id of the default gong
pub const DEFAULT_GONG_ID: &str = "gong1";

// ============================================================================
// Built-in catalogs
// ============================================================================

/// Returns the built-in ambient sound catalog, silence first.
#[must_use]
pub fn builtin_sounds() -> Vec<SoundOption> {
    vec![
        SoundOption {
            value: SILENCE_SOUND_ID.to_string(),
            label: "🔇 Silence".to_string(),
            file: None,
            is_custom: false,
        },
        SoundOption {
            value: "rain".to_string(),
            label: "🌧️ Pluie".to_string(),
            file: Some("ambient/rain.mp3".to_string()),
            is_custom: false,
        },
        SoundOption {
            value: "ocean".to_string(),
            label: "🌊 Océan".to_string(),
            file: Some("ambient/ocean.mp3".to_string()),
            is_custom: false,
        },
    ]
}

/// Returns the fixed gong catalog.
#[must_use]
pub fn builtin_gongs() -> Vec<GongOption> {
    vec![
        GongOption {
            id: "gong1".to_string(),
            name: "Gong Tibétain".to_string(),
            file: "gongs/gong_hit.wav".to_string(),
        },
        GongOption {
            id: "gong2".to_string(),
            name: "Gong Chinois".to_string(),
            file: "gongs/roger_gong.mp3".to_string(),
        },
        GongOption {
            id: "gong3".to_string(),
            name: "Gong Japonais".to_string(),
            file: "gongs/studio_gong.wav".to_string(),
        },
        GongOption {
            id: "gong4".to_string(),
            name: "Gong Zen".to_string(),
            file: "gongs/zen_gong.wav".to_string(),
        },
    ]
}

/// Looks up a gong by catalog id.
#[must_use]
pub fn find_gong(id: &str) -> Option<GongOption> {
    builtin_gongs().into_iter().find(|gong| gong.id == id)
}

// ============================================================================
// SoundLibrary
// ============================================================================

/// The merged ambient sound catalog with its persistence handling.
///
/// Built-in entries always come first and are immutable; custom entries
/// follow in insertion order.
#[derive(Debug)]
pub struct SoundLibrary {
    /// Data directory all relative payload paths resolve against
    root: PathBuf,
    custom: Vec<SoundOption>,
    /// Highest timestamp handed out for a custom id, keeps ids unique
    /// even when two imports land in the same millisecond
    last_custom_millis: u64,
}

impl SoundLibrary {
    /// Loads the custom catalog from the store.
    ///
    /// A missing document yields an empty custom list; an unreadable or
    /// malformed one is logged and treated the same way.
    pub fn load(store: &dyn DocumentStore, root: PathBuf) -> Self {
        let custom = match store.read_document(CUSTOM_SOUNDS_KEY) {
            Ok(Some(bytes)) => match serde_json::from_slice::<Vec<SoundOption>>(&bytes) {
                Ok(entries) => {
                    let entries: Vec<SoundOption> =
                        entries.into_iter().filter(|entry| entry.is_custom).collect();
                    info!("{} son(s) personnalisé(s) chargé(s)", entries.len());
                    entries
                }
                Err(e) => {
                    warn!("Catalogue des sons personnalisés illisible : {e}");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Lecture du catalogue des sons impossible : {e}");
                Vec::new()
            }
        };
        Self {
            root,
            custom,
            last_custom_millis: 0,
        }
    }

    /// Builds an empty library rooted at the given data directory.
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            custom: Vec::new(),
            last_custom_millis: 0,
        }
    }

    /// Full catalog: built-ins first, then custom sounds.
    #[must_use]
    pub fn list_all(&self) -> Vec<SoundOption> {
        let mut all = builtin_sounds();
        all.extend(self.custom.iter().cloned());
        all
    }

    #[must_use]
    pub fn find(&self, id: &str) -> Option<SoundOption> {
        self.list_all().into_iter().find(|sound| sound.value == id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    #[must_use]
    pub fn custom_count(&self) -> usize {
        self.custom.len()
    }

    /// Resolves an ambient catalog id to a playable track.
    ///
    /// Silence and unknown ids resolve to no track at all.
    #[must_use]
    pub fn ambient_track(&self, id: &str) -> Option<AudioTrack> {
        let file = self.find(id)?.file?;
        Some(AudioTrack::File(self.root.join(file)))
    }

    /// Resolves a gong catalog id to a playable track.
    ///
    /// An unknown id resolves to the embedded fallback gong.
    #[must_use]
    pub fn gong_track(&self, id: &str) -> AudioTrack {
        match find_gong(id) {
            Some(gong) => AudioTrack::File(self.root.join(gong.file)),
            None => {
                warn!("Gong inconnu : {id}, repli sur le gong intégré");
                AudioTrack::Embedded(embedded_gong())
            }
        }
    }

    /// Imports a file chosen through the picker into the custom catalog.
    ///
    /// Returns the new entry, or None when the user cancelled the pick or
    /// the file could not be read. The payload and catalog writes are
    /// best-effort: on failure the entry still joins the in-memory
    /// catalog and the problem is only logged.
    pub fn add_custom(
        &mut self,
        picker: &dyn FilePicker,
        store: &dyn DocumentStore,
    ) -> Option<SoundOption> {
        let picked = match picker.pick() {
            Some(picked) => picked,
            None => {
                info!("Aucun fichier sélectionné, import abandonné");
                return None;
            }
        };

        let id = self.next_custom_id();
        let source = PathBuf::from(&picked.name);
        let label = source
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|stem| !stem.is_empty())
            .unwrap_or_else(|| id.clone());
        let relative = match source.extension() {
            Some(ext) => format!("{SOUNDS_SUBDIR}/{id}.{}", ext.to_string_lossy()),
            None => format!("{SOUNDS_SUBDIR}/{id}"),
        };

        if let Err(e) = store.store_payload(&relative, &picked.bytes) {
            warn!("Copie du fichier audio impossible : {e}");
        }

        let option = SoundOption {
            value: id,
            label,
            file: Some(relative),
            is_custom: true,
        };
        self.custom.push(option.clone());
        self.persist(store);
        info!("Son personnalisé ajouté : {} ({})", option.label, option.value);
        Some(option)
    }

    /// Removes a custom sound and deletes its payload best-effort.
    pub fn remove_custom(
        &mut self,
        id: &str,
        store: &dyn DocumentStore,
    ) -> Result<SoundOption, String> {
        if builtin_sounds().iter().any(|sound| sound.value == id) {
            return Err("Les sons intégrés ne peuvent pas être supprimés".to_string());
        }
        let position = self
            .custom
            .iter()
            .position(|sound| sound.value == id)
            .ok_or_else(|| format!("Son inconnu : {id}"))?;

        let removed = self.custom.remove(position);
        if let Some(relative) = &removed.file {
            if let Err(e) = store.delete_resource(relative) {
                warn!("Suppression du fichier audio impossible : {e}");
            }
        }
        self.persist(store);
        info!("Son personnalisé supprimé : {}", removed.value);
        Ok(removed)
    }

    /// Writes the custom catalog document, logging failures instead of
    /// propagating them; the in-memory catalog stays authoritative.
    fn persist(&self, store: &dyn DocumentStore) {
        match serde_json::to_vec_pretty(&self.custom) {
            Ok(bytes) => {
                if let Err(e) = store.write_document(CUSTOM_SOUNDS_KEY, &bytes) {
                    warn!("Écriture du catalogue des sons impossible : {e}");
                }
            }
            Err(e) => warn!("Sérialisation du catalogue des sons impossible : {e}"),
        }
    }

    /// Allocates a unique custom id from the current time.
    fn next_custom_id(&mut self) -> String {
        let mut millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or(0);
        if millis <= self.last_custom_millis {
            millis = self.last_custom_millis + 1;
        }
        while self.contains(&format!("custom-{millis}")) {
            millis += 1;
        }
        self.last_custom_millis = millis;
        let id = format!("custom-{millis}");
        debug!("Nouvel identifiant de son personnalisé : {id}");
        id
    }
}

// ============================================================================
// Tests
// ============================================================================
