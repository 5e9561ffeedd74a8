//! Audio playback error types.
//!
//! This module defines the error types for the audio subsystem. All
//! playback failures are eventually logged and swallowed by the callers,
//! so the variants here mainly exist to make those log lines precise and
//! to drive the embedded-gong fallback.

use thiserror::Error;

/// Errors that can occur in the audio subsystem.
#[derive(Debug, Error)]
pub enum SoundError {
    /// Audio output device is not available (e.g., no sound card).
    #[error("Périphérique audio indisponible : {0}")]
    DeviceNotAvailable(String),

    /// Audio file was not found at the specified path.
    #[error("Fichier audio introuvable : {0}")]
    FileNotFound(String),

    /// Failed to decode the audio file.
    #[error("Échec du décodage du fichier audio : {0}")]
    DecodeError(String),

    /// Failed to create the audio output stream or a sink on it.
    #[error("Échec de création du flux audio : {0}")]
    StreamError(String),

    /// The dedicated audio thread is gone.
    #[error("Le fil audio ne répond plus : {0}")]
    ChannelClosed(String),

    /// Generic playback error.
    #[error("Erreur de lecture audio : {0}")]
    PlaybackError(String),
}

impl SoundError {
    /// Returns true if this error is related to device availability.
    #[must_use]
    pub fn is_device_error(&self) -> bool {
        matches!(self, Self::DeviceNotAvailable(_) | Self::StreamError(_))
    }

    /// Returns true if gong playback should retry with the embedded sound.
    #[must_use]
    pub fn should_fallback_to_embedded(&self) -> bool {
        matches!(self, Self::FileNotFound(_) | Self::DecodeError(_))
    }
}
