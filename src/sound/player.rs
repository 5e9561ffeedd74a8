//! Audio backend implementation using rodio.
//!
//! Rodio's output stream is not `Send`, so all playback state lives on a
//! dedicated thread that owns the stream and its sinks. The
//! `RodioAudioPlayer` handed to the daemon is just a command sender plus
//! an availability flag; every trait method enqueues a command and
//! returns immediately. The thread wakes up at the fade tick rate to
//! advance stepped fade-outs even when no commands arrive.

use std::fs::File;
use std::io::{BufReader, Cursor};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use tracing::{debug, warn};

use super::embedded::embedded_gong;
use super::error::SoundError;
use super::{AudioPlayer, AudioTrack};

/// Milliseconds between fade steps (also the thread's wake-up interval)
const FADE_TICK_MS: u64 = 50;

/// Number of fade steps; with [`FADE_TICK_MS`] this gives a 400ms fade
const FADE_STEPS: u32 = 8;

// ============================================================================
// Commands
// ============================================================================

/// Commands understood by the audio thread.
#[derive(Debug)]
enum AudioCommand {
    AmbientPlay { track: AudioTrack, volume: f32 },
    AmbientPause,
    AmbientResume,
    AmbientStop,
    AmbientVolume(f32),
    GongPlay { track: AudioTrack, volume: f32 },
    GongVolume(f32),
    PreviewPlay { track: AudioTrack, volume: f32 },
    PreviewStop { fade: bool },
    PreviewVolume(f32),
    Shutdown,
}

// ============================================================================
// RodioAudioPlayer
// ============================================================================

/// Audio backend that forwards all playback to a dedicated rodio thread.
///
/// The player is thread-safe and cheap to share behind an `Arc`. When no
/// output device can be opened the thread stays alive and swallows every
/// command, so the daemon runs normally without sound.
pub struct RodioAudioPlayer {
    commands: Sender<AudioCommand>,
    available: Arc<AtomicBool>,
}

impl RodioAudioPlayer {
    /// Creates the player and spawns its audio thread.
    ///
    /// # Errors
    ///
    /// Returns an error only when the operating system refuses to spawn
    /// the thread; an absent audio device is not an error.
    pub fn new() -> Result<Self, SoundError> {
        let (commands, receiver) = crossbeam_channel::unbounded();
        let available = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&available);

        std::thread::Builder::new()
            .name("meditimer-audio".to_string())
            .spawn(move || run_audio_thread(receiver, flag))
            .map_err(|e| SoundError::PlaybackError(format!("fil audio : {e}")))?;

        Ok(Self {
            commands,
            available,
        })
    }

    fn send(&self, command: AudioCommand) -> Result<(), SoundError> {
        self.commands
            .send(command)
            .map_err(|e| SoundError::ChannelClosed(e.to_string()))
    }
}

impl AudioPlayer for RodioAudioPlayer {
    fn play_ambient(&self, track: &AudioTrack, volume: f32) -> Result<(), SoundError> {
        self.send(AudioCommand::AmbientPlay {
            track: track.clone(),
            volume,
        })
    }

    fn pause_ambient(&self) -> Result<(), SoundError> {
        self.send(AudioCommand::AmbientPause)
    }

    fn resume_ambient(&self) -> Result<(), SoundError> {
        self.send(AudioCommand::AmbientResume)
    }

    fn stop_ambient(&self) -> Result<(), SoundError> {
        self.send(AudioCommand::AmbientStop)
    }

    fn set_ambient_volume(&self, volume: f32) -> Result<(), SoundError> {
        self.send(AudioCommand::AmbientVolume(volume))
    }

    fn play_gong(&self, track: &AudioTrack, volume: f32) -> Result<(), SoundError> {
        self.send(AudioCommand::GongPlay {
            track: track.clone(),
            volume,
        })
    }

    fn set_gong_volume(&self, volume: f32) -> Result<(), SoundError> {
        self.send(AudioCommand::GongVolume(volume))
    }

    fn play_preview(&self, track: &AudioTrack, volume: f32) -> Result<(), SoundError> {
        self.send(AudioCommand::PreviewPlay {
            track: track.clone(),
            volume,
        })
    }

    fn stop_preview(&self, fade: bool) -> Result<(), SoundError> {
        self.send(AudioCommand::PreviewStop { fade })
    }

    fn set_preview_volume(&self, volume: f32) -> Result<(), SoundError> {
        self.send(AudioCommand::PreviewVolume(volume))
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}

impl Drop for RodioAudioPlayer {
    fn drop(&mut self) {
        let _ = self.commands.send(AudioCommand::Shutdown);
    }
}

impl std::fmt::Debug for RodioAudioPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioAudioPlayer")
            .field("available", &self.is_available())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Audio thread
// ============================================================================

fn run_audio_thread(receiver: Receiver<AudioCommand>, available: Arc<AtomicBool>) {
    let (_stream, handle) = match OutputStream::try_default() {
        Ok(pair) => pair,
        Err(e) => {
            warn!("Pas de périphérique audio, lecture désactivée : {e}");
            // keep draining so senders never block or error out
            while let Ok(command) = receiver.recv() {
                if matches!(command, AudioCommand::Shutdown) {
                    break;
                }
            }
            return;
        }
    };
    available.store(true, Ordering::SeqCst);
    debug!("Flux audio initialisé");

    let mut mixer = Mixer::new(handle);
    loop {
        match receiver.recv_timeout(Duration::from_millis(FADE_TICK_MS)) {
            Ok(AudioCommand::Shutdown) => break,
            Ok(command) => mixer.handle(command),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
        mixer.step_fades();
    }
    debug!("Fil audio arrêté");
}

/// A preview sink being faded to silence.
struct FadingSink {
    sink: Sink,
    base_volume: f32,
    steps_left: u32,
}

/// Playback state owned by the audio thread.
struct Mixer {
    handle: OutputStreamHandle,
    ambient: Option<Sink>,
    gong: Option<Sink>,
    preview: Option<Sink>,
    fading: Vec<FadingSink>,
}

impl Mixer {
    fn new(handle: OutputStreamHandle) -> Self {
        Self {
            handle,
            ambient: None,
            gong: None,
            preview: None,
            fading: Vec::new(),
        }
    }

    /// Applies one command. Playback failures end here as log lines;
    /// there is no error path back to the daemon.
    fn handle(&mut self, command: AudioCommand) {
        match command {
            AudioCommand::AmbientPlay { track, volume } => {
                // dropping the old sink cuts it off, the new loop starts
                // from the beginning of the track
                self.ambient = None;
                match self.build_sink(&track, volume, true) {
                    Ok(sink) => {
                        debug!("Lecture ambiante : {}", track.describe());
                        self.ambient = Some(sink);
                    }
                    Err(e) => warn!("Lecture ambiante impossible : {e}"),
                }
            }
            AudioCommand::AmbientPause => {
                if let Some(sink) = &self.ambient {
                    sink.pause();
                }
            }
            AudioCommand::AmbientResume => {
                if let Some(sink) = &self.ambient {
                    sink.play();
                }
            }
            AudioCommand::AmbientStop => {
                self.ambient = None;
            }
            AudioCommand::AmbientVolume(volume) => {
                if let Some(sink) = &self.ambient {
                    sink.set_volume(volume);
                }
            }
            AudioCommand::GongPlay { track, volume } => {
                // an earlier gong keeps ringing underneath the new one
                if let Some(old) = self.gong.take() {
                    old.detach();
                }
                match self.build_gong_sink(&track, volume) {
                    Ok(sink) => {
                        debug!("Gong : {}", track.describe());
                        self.gong = Some(sink);
                    }
                    Err(e) => warn!("Lecture du gong impossible : {e}"),
                }
            }
            AudioCommand::GongVolume(volume) => {
                if let Some(sink) = &self.gong {
                    sink.set_volume(volume);
                }
            }
            AudioCommand::PreviewPlay { track, volume } => {
                self.begin_preview_fade();
                match self.build_sink(&track, volume, true) {
                    Ok(sink) => {
                        debug!("Aperçu : {}", track.describe());
                        self.preview = Some(sink);
                    }
                    Err(e) => warn!("Lecture de l'aperçu impossible : {e}"),
                }
            }
            AudioCommand::PreviewStop { fade } => {
                if fade {
                    self.begin_preview_fade();
                } else {
                    self.preview = None;
                }
            }
            AudioCommand::PreviewVolume(volume) => {
                if let Some(sink) = &self.preview {
                    sink.set_volume(volume);
                }
            }
            AudioCommand::Shutdown => unreachable!("handled by the thread loop"),
        }
    }

    /// Moves the current preview sink into the fading set.
    fn begin_preview_fade(&mut self) {
        if let Some(sink) = self.preview.take() {
            self.fading.push(FadingSink {
                base_volume: sink.volume(),
                steps_left: FADE_STEPS,
                sink,
            });
        }
    }

    /// Advances every fading sink by one step, dropping finished ones.
    fn step_fades(&mut self) {
        self.fading.retain_mut(|fading| {
            fading.steps_left -= 1;
            if fading.steps_left == 0 {
                false
            } else {
                let factor = fading.steps_left as f32 / FADE_STEPS as f32;
                fading.sink.set_volume(fading.base_volume * factor);
                true
            }
        });
    }

    /// Builds a sink playing the track once with the embedded gong as a
    /// fallback when the file cannot be read or decoded.
    fn build_gong_sink(&self, track: &AudioTrack, volume: f32) -> Result<Sink, SoundError> {
        match self.build_sink(track, volume, false) {
            Ok(sink) => Ok(sink),
            Err(e) if e.should_fallback_to_embedded() => {
                warn!("{e}, repli sur le gong intégré");
                self.build_sink(&AudioTrack::Embedded(embedded_gong()), volume, false)
            }
            Err(e) => Err(e),
        }
    }

    fn build_sink(
        &self,
        track: &AudioTrack,
        volume: f32,
        looped: bool,
    ) -> Result<Sink, SoundError> {
        let sink =
            Sink::try_new(&self.handle).map_err(|e| SoundError::StreamError(e.to_string()))?;
        sink.set_volume(volume);
        match track {
            AudioTrack::File(path) => {
                let file = File::open(path)
                    .map_err(|e| SoundError::FileNotFound(format!("{}: {e}", path.display())))?;
                let decoder = Decoder::new(BufReader::new(file))
                    .map_err(|e| SoundError::DecodeError(e.to_string()))?;
                if looped {
                    sink.append(decoder.repeat_infinite());
                } else {
                    sink.append(decoder);
                }
            }
            AudioTrack::Embedded(bytes) => {
                let decoder = Decoder::new(Cursor::new(*bytes))
                    .map_err(|e| SoundError::DecodeError(format!("intégré : {e}")))?;
                if looped {
                    sink.append(decoder.repeat_infinite());
                } else {
                    sink.append(decoder);
                }
            }
        }
        Ok(sink)
    }
}
