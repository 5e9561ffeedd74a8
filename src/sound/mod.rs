//! Audio playback for the meditation timer.
//!
//! This module provides the three independent playback channels the
//! timer needs:
//!
//! - a looping ambient channel that follows the session lifecycle
//! - a one-shot gong channel for start, interval and end gongs
//! - a looping preview channel with a stepped fade-out
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │   AudioPlayer    │ ← Trait used by the daemon
//! └────────┬─────────┘
//!          │ commands (crossbeam channel)
//!          ▼
//! ┌──────────────────┐     ┌──────────────────┐
//! │   Audio thread   │────▶│  ambient sink    │
//! │ (rodio, blocking │────▶│  gong sink       │
//! │  decode + fades) │────▶│  preview sink    │
//! └──────────────────┘     └──────────────────┘
//! ```
//!
//! All trait methods are non-blocking: they enqueue a command for the
//! dedicated audio thread and return. When no output device exists the
//! thread keeps draining commands so the rest of the daemon runs
//! normally, just silently.

mod embedded;
mod error;
mod player;

pub mod catalog;

pub use embedded::{embedded_gong, EMBEDDED_GONG_DATA};
pub use error::SoundError;
pub use player::RodioAudioPlayer;

use std::path::PathBuf;

/// A playable piece of audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioTrack {
    /// Audio file on disk
    File(PathBuf),
    /// Audio data compiled into the binary
    Embedded(&'static [u8]),
}

impl AudioTrack {
    /// Human-readable description for log lines.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            AudioTrack::File(path) => path.display().to_string(),
            AudioTrack::Embedded(_) => "<embedded>".to_string(),
        }
    }
}

/// Trait for the timer's audio backend.
///
/// This abstracts playback so the daemon logic can be tested against a
/// mock. Every method is non-blocking and fire-and-forget; failures are
/// reported so callers can log them, never so they can abort.
pub trait AudioPlayer: Send + Sync {
    /// Starts the looping ambient track, replacing any current one.
    ///
    /// Replacement is a hard cut and the new loop starts from the
    /// beginning of the track.
    fn play_ambient(&self, track: &AudioTrack, volume: f32) -> Result<(), SoundError>;

    /// Freezes the ambient loop in place.
    fn pause_ambient(&self) -> Result<(), SoundError>;

    /// Resumes a paused ambient loop where it stopped.
    fn resume_ambient(&self) -> Result<(), SoundError>;

    /// Stops and discards the ambient loop; the next play starts over.
    fn stop_ambient(&self) -> Result<(), SoundError>;

    /// Adjusts the live ambient volume.
    fn set_ambient_volume(&self, volume: f32) -> Result<(), SoundError>;

    /// Plays a gong once. Overlapping gongs are allowed.
    fn play_gong(&self, track: &AudioTrack, volume: f32) -> Result<(), SoundError>;

    /// Adjusts the volume of a gong that is still sounding.
    fn set_gong_volume(&self, volume: f32) -> Result<(), SoundError>;

    /// Starts the looping preview track, fading out any current preview.
    fn play_preview(&self, track: &AudioTrack, volume: f32) -> Result<(), SoundError>;

    /// Stops the preview, with a stepped fade-out or immediately.
    fn stop_preview(&self, fade: bool) -> Result<(), SoundError>;

    /// Adjusts the live preview volume.
    fn set_preview_volume(&self, volume: f32) -> Result<(), SoundError>;

    /// Returns true if an audio output device was opened.
    fn is_available(&self) -> bool;
}

/// One recorded call on the [`MockAudioPlayer`].
#[derive(Debug, Clone, PartialEq)]
pub enum AudioCall {
    PlayAmbient { track: AudioTrack, volume: f32 },
    PauseAmbient,
    ResumeAmbient,
    StopAmbient,
    AmbientVolume(f32),
    PlayGong { track: AudioTrack, volume: f32 },
    GongVolume(f32),
    PlayPreview { track: AudioTrack, volume: f32 },
    StopPreview { fade: bool },
    PreviewVolume(f32),
}

/// Mock audio backend for testing.
#[derive(Debug, Default)]
pub struct MockAudioPlayer {
    calls: std::sync::Mutex<Vec<AudioCall>>,
    available: std::sync::atomic::AtomicBool,
    should_fail: std::sync::atomic::AtomicBool,
}

impl MockAudioPlayer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            calls: std::sync::Mutex::new(Vec::new()),
            available: std::sync::atomic::AtomicBool::new(true),
            should_fail: std::sync::atomic::AtomicBool::new(false),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available
            .store(available, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail
            .store(should_fail, std::sync::atomic::Ordering::SeqCst);
    }

    #[must_use]
    pub fn calls(&self) -> Vec<AudioCall> {
        self.calls.lock().unwrap().clone()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Number of gong strikes recorded so far.
    #[must_use]
    pub fn gong_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| matches!(call, AudioCall::PlayGong { .. }))
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: AudioCall) -> Result<(), SoundError> {
        if self.should_fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(SoundError::PlaybackError("Mock failure".to_string()));
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

impl AudioPlayer for MockAudioPlayer {
    fn play_ambient(&self, track: &AudioTrack, volume: f32) -> Result<(), SoundError> {
        self.record(AudioCall::PlayAmbient {
            track: track.clone(),
            volume,
        })
    }

    fn pause_ambient(&self) -> Result<(), SoundError> {
        self.record(AudioCall::PauseAmbient)
    }

    fn resume_ambient(&self) -> Result<(), SoundError> {
        self.record(AudioCall::ResumeAmbient)
    }

    fn stop_ambient(&self) -> Result<(), SoundError> {
        self.record(AudioCall::StopAmbient)
    }

    fn set_ambient_volume(&self, volume: f32) -> Result<(), SoundError> {
        self.record(AudioCall::AmbientVolume(volume))
    }

    fn play_gong(&self, track: &AudioTrack, volume: f32) -> Result<(), SoundError> {
        self.record(AudioCall::PlayGong {
            track: track.clone(),
            volume,
        })
    }

    fn set_gong_volume(&self, volume: f32) -> Result<(), SoundError> {
        self.record(AudioCall::GongVolume(volume))
    }

    fn play_preview(&self, track: &AudioTrack, volume: f32) -> Result<(), SoundError> {
        self.record(AudioCall::PlayPreview {
            track: track.clone(),
            volume,
        })
    }

    fn stop_preview(&self, fade: bool) -> Result<(), SoundError> {
        self.record(AudioCall::StopPreview { fade })
    }

    fn set_preview_volume(&self, volume: f32) -> Result<(), SoundError> {
        self.record(AudioCall::PreviewVolume(volume))
    }

    fn is_available(&self) -> bool {
        self.available.load(std::sync::atomic::Ordering::SeqCst)
    }
}
