//! Meditation Timer Library
//!
//! This library provides the core functionality for the meditimer CLI.
//! It includes:
//! - Session state machine with preparation countdown and gong schedule
//! - IPC server/client for daemon-CLI communication
//! - CLI command parsing and display utilities
//! - Ambient sound catalog with user-imported sounds
//! - Audio playback through a dedicated thread (ambient, gongs, previews)
//! - JSON document storage for catalogs and preferences

pub mod cli;
pub mod daemon;
pub mod picker;
pub mod prefs;
pub mod sound;
pub mod storage;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    GongMoments, GongOption, IpcRequest, IpcResponse, ResponseData, SessionConfig, SessionOptions,
    SessionPhase, SessionState, SoundOption,
};

// Re-export sound types
pub use sound::{AudioPlayer, AudioTrack, MockAudioPlayer, RodioAudioPlayer, SoundError};

// Re-export storage types
pub use storage::{DocumentStore, FsDocumentStore, MemoryDocumentStore, StorageError};

// Re-export picker types
pub use picker::{FilePicker, MockFilePicker, PathPicker, PickedFile};
