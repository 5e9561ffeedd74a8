//! Core type definitions for the meditation timer
//!
//! This module defines the data structures used for:
//! - Session state management (phases, clocks, tick effects)
//! - Session configuration and user options with validation
//! - Sound catalog entries
//! - IPC request/response serialization

use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Preset session durations offered by the CLI, in minutes (0 = unbounded)
pub const DURATION_CHOICES: [u32; 8] = [0, 5, 10, 15, 20, 30, 45, 60];

/// Preset periodic gong intervals, in minutes (0 = disabled)
pub const INTERVAL_CHOICES: [u32; 5] = [0, 5, 10, 15, 30];

/// Upper bound for session durations and gong intervals, in minutes
pub const MAX_DURATION_MINUTES: u32 = 180;

/// Default preparation countdown before a session begins, in seconds
pub const DEFAULT_PREPARATION_SECONDS: u32 = 10;

/// Default auto-stop window for ambient sound previews, in seconds
pub const DEFAULT_PREVIEW_SECONDS: u64 = 8;

/// Catalog id of the built-in silent entry
pub const SILENCE_SOUND_ID: &str = "silence";

// ============================================================================
// Session Configuration
// ============================================================================

/// Which moments of a session are marked with a gong
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GongMoments {
    pub start: bool,
    pub end: bool,
}

/// Immutable snapshot of the options a session runs with
///
/// A config is captured from [`SessionOptions`] when a session starts and
/// is never updated afterwards, so option changes made during a session
/// only apply to the next one. Volume changes are the exception: they are
/// applied directly to the audio sinks and bypass the config entirely.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Ambient sound catalog id
    pub sound: String,
    /// Gong catalog id
    pub gong: String,
    /// Ambient loop volume in 0.0..=1.0
    pub ambient_volume: f32,
    /// Gong volume in 0.0..=1.0
    pub gong_volume: f32,
    /// Session length in minutes, 0 for an unbounded session
    pub duration_minutes: u32,
    /// Minutes between periodic gongs, 0 to disable them
    pub interval_minutes: u32,
    /// Start and end gong toggles
    pub moments: GongMoments,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionOptions::default().snapshot()
    }
}

impl SessionConfig {
    /// Validates the configuration.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.ambient_volume) {
            return Err("Le volume ambiant doit être entre 0.0 et 1.0".to_string());
        }
        if !(0.0..=1.0).contains(&self.gong_volume) {
            return Err("Le volume du gong doit être entre 0.0 et 1.0".to_string());
        }
        if self.duration_minutes > MAX_DURATION_MINUTES {
            return Err(format!(
                "La durée doit être entre 0 et {MAX_DURATION_MINUTES} minutes"
            ));
        }
        if self.interval_minutes > MAX_DURATION_MINUTES {
            return Err(format!(
                "L'intervalle doit être entre 0 et {MAX_DURATION_MINUTES} minutes"
            ));
        }
        Ok(())
    }

    /// Initial countdown until the first periodic gong, if any
    pub fn initial_gong_countdown(&self) -> Option<u32> {
        (self.interval_minutes > 0).then(|| self.interval_minutes * 60)
    }
}

// ============================================================================
// Session Options
// ============================================================================

/// The user-adjustable options, as they stand between sessions
///
/// Setters clamp or reject out-of-range values so that a snapshot taken
/// from here is always a valid [`SessionConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    pub sound: String,
    pub gong: String,
    pub ambient_volume: f32,
    pub gong_volume: f32,
    pub duration_minutes: u32,
    pub interval_minutes: u32,
    pub moments: GongMoments,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            sound: SILENCE_SOUND_ID.to_string(),
            gong: "gong1".to_string(),
            ambient_volume: 0.5,
            gong_volume: 0.7,
            duration_minutes: 10,
            interval_minutes: 0,
            moments: GongMoments::default(),
        }
    }
}

impl SessionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures the config a new session will run with
    pub fn snapshot(&self) -> SessionConfig {
        SessionConfig {
            sound: self.sound.clone(),
            gong: self.gong.clone(),
            ambient_volume: self.ambient_volume,
            gong_volume: self.gong_volume,
            duration_minutes: self.duration_minutes,
            interval_minutes: self.interval_minutes,
            moments: self.moments,
        }
    }

    /// Sets the session duration in minutes (0 = unbounded)
    ///
    /// Returns false and leaves the current value in place when the
    /// requested duration is out of range.
    pub fn set_duration(&mut self, minutes: u32) -> bool {
        if minutes > MAX_DURATION_MINUTES {
            return false;
        }
        self.duration_minutes = minutes;
        true
    }

    /// Sets a free-form custom duration from raw user input
    ///
    /// Only whole minute counts in 1..=[`MAX_DURATION_MINUTES`] are
    /// accepted; anything else is rejected without touching the current
    /// value so callers can ignore bad input silently.
    pub fn set_custom_duration(&mut self, raw: &str) -> bool {
        match raw.trim().parse::<u32>() {
            Ok(minutes) if (1..=MAX_DURATION_MINUTES).contains(&minutes) => {
                self.duration_minutes = minutes;
                true
            }
            _ => false,
        }
    }

    /// Sets the periodic gong interval in minutes (0 = disabled)
    pub fn set_interval(&mut self, minutes: u32) -> Result<(), String> {
        if minutes > MAX_DURATION_MINUTES {
            return Err(format!(
                "L'intervalle doit être entre 0 et {MAX_DURATION_MINUTES} minutes"
            ));
        }
        self.interval_minutes = minutes;
        Ok(())
    }

    /// Sets the ambient volume, clamped to 0.0..=1.0, and returns the
    /// value actually stored
    pub fn set_ambient_volume(&mut self, volume: f32) -> f32 {
        if volume.is_finite() {
            self.ambient_volume = volume.clamp(0.0, 1.0);
        }
        self.ambient_volume
    }

    /// Sets the gong volume, clamped to 0.0..=1.0, and returns the value
    /// actually stored
    pub fn set_gong_volume(&mut self, volume: f32) -> f32 {
        if volume.is_finite() {
            self.gong_volume = volume.clamp(0.0, 1.0);
        }
        self.gong_volume
    }

    pub fn set_moments(&mut self, start: Option<bool>, end: Option<bool>) {
        if let Some(start) = start {
            self.moments.start = start;
        }
        if let Some(end) = end {
            self.moments.end = end;
        }
    }
}

// ============================================================================
// Session Clock
// ============================================================================

/// Second counter for a running session
///
/// Bounded sessions count down to zero, unbounded sessions count up
/// forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionClock {
    Down { remaining_seconds: u32 },
    Up { elapsed_seconds: u32 },
}

impl SessionClock {
    /// Builds the clock for a session of the given length (0 = unbounded)
    pub fn for_duration(duration_minutes: u32) -> Self {
        if duration_minutes == 0 {
            SessionClock::Up { elapsed_seconds: 0 }
        } else {
            SessionClock::Down {
                remaining_seconds: duration_minutes * 60,
            }
        }
    }

    /// Advances the clock by one second
    pub fn advance(&mut self) {
        match self {
            SessionClock::Down { remaining_seconds } => {
                *remaining_seconds = remaining_seconds.saturating_sub(1);
            }
            SessionClock::Up { elapsed_seconds } => {
                *elapsed_seconds = elapsed_seconds.saturating_add(1);
            }
        }
    }

    /// True once a bounded clock has reached zero
    pub fn is_exhausted(&self) -> bool {
        matches!(
            self,
            SessionClock::Down {
                remaining_seconds: 0
            }
        )
    }

    pub fn remaining(&self) -> Option<u32> {
        match self {
            SessionClock::Down { remaining_seconds } => Some(*remaining_seconds),
            SessionClock::Up { .. } => None,
        }
    }

    pub fn elapsed(&self) -> Option<u32> {
        match self {
            SessionClock::Up { elapsed_seconds } => Some(*elapsed_seconds),
            SessionClock::Down { .. } => None,
        }
    }
}

// ============================================================================
// Session Phase
// ============================================================================

/// Represents the current phase of a session.
///
/// Counters live inside the variants that need them, so a phase value is
/// always internally consistent: there is no preparation countdown
/// outside `Preparing` and no session clock outside `Running`/`Paused`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No session, options freely editable
    Idle,
    /// Pre-session countdown, no sound yet
    Preparing { remaining_seconds: u32 },
    /// Session in progress
    Running {
        clock: SessionClock,
        /// Seconds until the next periodic gong, None when disabled
        next_gong_seconds: Option<u32>,
    },
    /// Session frozen, all counters held
    Paused {
        clock: SessionClock,
        next_gong_seconds: Option<u32>,
    },
    /// A bounded session ran to completion
    Finished,
}

impl SessionPhase {
    /// Stable lowercase identifier used on the wire
    pub fn name(&self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Preparing { .. } => "preparing",
            SessionPhase::Running { .. } => "running",
            SessionPhase::Paused { .. } => "paused",
            SessionPhase::Finished => "finished",
        }
    }

    /// True while a session exists, including its preparation countdown
    pub fn is_in_session(&self) -> bool {
        matches!(
            self,
            SessionPhase::Preparing { .. }
                | SessionPhase::Running { .. }
                | SessionPhase::Paused { .. }
        )
    }

    /// True in the phases the one-second ticker must advance
    pub fn is_counting(&self) -> bool {
        matches!(
            self,
            SessionPhase::Preparing { .. } | SessionPhase::Running { .. }
        )
    }

    /// True in the phases where previews may play
    pub fn can_configure(&self) -> bool {
        matches!(self, SessionPhase::Idle | SessionPhase::Finished)
    }
}

impl Default for SessionPhase {
    fn default() -> Self {
        SessionPhase::Idle
    }
}

// ============================================================================
// Session State
// ============================================================================

/// What a single tick of the session state machine produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickEffect {
    /// Nothing to do (not in a counting phase)
    None,
    /// Preparation countdown advanced
    Preparing { remaining_seconds: u32 },
    /// Preparation completed, the session proper just began
    SessionBegan,
    /// A plain counting second passed
    Counted,
    /// The periodic gong is due this second
    IntervalGong,
    /// A bounded session just ran out
    Finished,
}

/// The session state machine
///
/// All transitions go through the methods here; nothing else mutates the
/// phase. `config` holds the snapshot of the options captured when the
/// current (or most recent) session started.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub phase: SessionPhase,
    pub config: SessionConfig,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Idle,
            config: SessionConfig::default(),
        }
    }

    /// Starts a new session with the given config snapshot
    ///
    /// The session always opens with a preparation countdown of at least
    /// one second.
    pub fn start(&mut self, config: SessionConfig, preparation_seconds: u32) -> Result<(), String> {
        if self.phase.is_in_session() {
            return Err("Une séance est déjà en cours".to_string());
        }
        config.validate()?;
        self.config = config;
        self.phase = SessionPhase::Preparing {
            remaining_seconds: preparation_seconds.max(1),
        };
        Ok(())
    }

    /// Freezes a running session
    pub fn pause(&mut self) -> Result<(), String> {
        match self.phase {
            SessionPhase::Running {
                clock,
                next_gong_seconds,
            } => {
                self.phase = SessionPhase::Paused {
                    clock,
                    next_gong_seconds,
                };
                Ok(())
            }
            _ => Err("Aucune séance en cours".to_string()),
        }
    }

    /// Resumes a paused session where it left off
    pub fn resume(&mut self) -> Result<(), String> {
        match self.phase {
            SessionPhase::Paused {
                clock,
                next_gong_seconds,
            } => {
                self.phase = SessionPhase::Running {
                    clock,
                    next_gong_seconds,
                };
                Ok(())
            }
            _ => Err("La séance n'est pas en pause".to_string()),
        }
    }

    /// Abandons the current session and returns to idle
    pub fn stop(&mut self) -> Result<(), String> {
        if !self.phase.is_in_session() {
            return Err("Aucune séance à arrêter".to_string());
        }
        self.phase = SessionPhase::Idle;
        Ok(())
    }

    /// Advances the state machine by one second
    ///
    /// The session clock moves first: a bounded session that reaches zero
    /// finishes immediately and a periodic gong due on that same second
    /// is dropped.
    pub fn tick(&mut self) -> TickEffect {
        match self.phase {
            SessionPhase::Preparing { remaining_seconds } => {
                let remaining = remaining_seconds.saturating_sub(1);
                if remaining == 0 {
                    self.phase = SessionPhase::Running {
                        clock: SessionClock::for_duration(self.config.duration_minutes),
                        next_gong_seconds: self.config.initial_gong_countdown(),
                    };
                    TickEffect::SessionBegan
                } else {
                    self.phase = SessionPhase::Preparing {
                        remaining_seconds: remaining,
                    };
                    TickEffect::Preparing {
                        remaining_seconds: remaining,
                    }
                }
            }
            SessionPhase::Running {
                mut clock,
                next_gong_seconds,
            } => {
                clock.advance();
                if clock.is_exhausted() {
                    self.phase = SessionPhase::Finished;
                    return TickEffect::Finished;
                }
                let (next_gong, gong_due) = match next_gong_seconds {
                    Some(1) => (self.config.initial_gong_countdown(), true),
                    Some(n) => (Some(n - 1), false),
                    None => (None, false),
                };
                self.phase = SessionPhase::Running {
                    clock,
                    next_gong_seconds: next_gong,
                };
                if gong_due {
                    TickEffect::IntervalGong
                } else {
                    TickEffect::Counted
                }
            }
            _ => TickEffect::None,
        }
    }

    pub fn remaining_seconds(&self) -> Option<u32> {
        match self.phase {
            SessionPhase::Preparing { remaining_seconds } => Some(remaining_seconds),
            SessionPhase::Running { clock, .. } | SessionPhase::Paused { clock, .. } => {
                clock.remaining()
            }
            SessionPhase::Idle | SessionPhase::Finished => Some(0),
        }
    }

    pub fn elapsed_seconds(&self) -> Option<u32> {
        match self.phase {
            SessionPhase::Running { clock, .. } | SessionPhase::Paused { clock, .. } => {
                clock.elapsed()
            }
            _ => None,
        }
    }

    pub fn next_gong_seconds(&self) -> Option<u32> {
        match self.phase {
            SessionPhase::Running {
                next_gong_seconds, ..
            }
            | SessionPhase::Paused {
                next_gong_seconds, ..
            } => next_gong_seconds,
            SessionPhase::Idle | SessionPhase::Finished => Some(0),
            SessionPhase::Preparing { .. } => None,
        }
    }
}

// ============================================================================
// Sound Catalog Entries
// ============================================================================

/// One entry of the ambient sound catalog
///
/// The serialized form uses the historical field names of the catalog
/// document, which double as the wire format for sound listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundOption {
    /// Unique catalog id
    pub value: String,
    /// Display label, possibly with a leading emoji
    pub label: String,
    /// Path of the audio payload relative to the data directory, absent
    /// for the silent entry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(rename = "isCustom", default)]
    pub is_custom: bool,
}

/// One entry of the fixed gong catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GongOption {
    pub id: String,
    pub name: String,
    /// Path of the audio payload relative to the data directory
    pub file: String,
}

// ============================================================================
// IPC Message Types
// ============================================================================

/// Request sent from CLI to daemon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum IpcRequest {
    /// Start a session from the current options
    Start,
    /// Pause the running session
    Pause,
    /// Resume the paused session
    Resume,
    /// Abandon the current session
    Stop,
    /// Get current session state and options
    Status,
    /// List the ambient sound catalog
    Sounds,
    /// List the gong catalog
    Gongs,
    /// Select an ambient sound
    UseSound {
        #[serde(rename = "soundId")]
        sound_id: String,
    },
    /// Select a gong
    UseGong {
        #[serde(rename = "gongId")]
        gong_id: String,
    },
    /// Adjust one or both volumes
    SetVolume {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ambient: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        gong: Option<f32>,
    },
    /// Set the session duration from raw user input
    SetDuration { value: String },
    /// Set the periodic gong interval in minutes
    SetInterval { minutes: u32 },
    /// Toggle the start/end gongs
    SetMoments {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        end: Option<bool>,
    },
    /// Play the selected gong once at the current gong volume
    TestGong,
    /// Import an audio file into the custom sound catalog
    AddSound { path: String },
    /// Remove a custom sound from the catalog
    RemoveSound {
        #[serde(rename = "soundId")]
        sound_id: String,
    },
    /// Switch or toggle the dark mode preference
    SetDarkMode {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        enabled: Option<bool>,
    },
}

/// Response sent from daemon to CLI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IpcResponse {
    /// "success" or "error"
    pub status: String,
    /// Human-readable message
    pub message: String,
    /// Optional structured payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl IpcResponse {
    pub fn success(message: impl Into<String>, data: Option<ResponseData>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Structured payload carried by responses
///
/// Every field is optional; each response fills in only what its command
/// produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResponseData {
    /// Phase name: idle, preparing, running, paused or finished
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(rename = "remainingSeconds", skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<u32>,
    #[serde(rename = "elapsedSeconds", skip_serializing_if = "Option::is_none")]
    pub elapsed_seconds: Option<u32>,
    #[serde(rename = "nextGongSeconds", skip_serializing_if = "Option::is_none")]
    pub next_gong_seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gong: Option<String>,
    #[serde(rename = "ambientVolume", skip_serializing_if = "Option::is_none")]
    pub ambient_volume: Option<f32>,
    #[serde(rename = "gongVolume", skip_serializing_if = "Option::is_none")]
    pub gong_volume: Option<f32>,
    #[serde(rename = "durationMinutes", skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(rename = "intervalMinutes", skip_serializing_if = "Option::is_none")]
    pub interval_minutes: Option<u32>,
    #[serde(rename = "gongStart", skip_serializing_if = "Option::is_none")]
    pub gong_start: Option<bool>,
    #[serde(rename = "gongEnd", skip_serializing_if = "Option::is_none")]
    pub gong_end: Option<bool>,
    #[serde(rename = "darkMode", skip_serializing_if = "Option::is_none")]
    pub dark_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sounds: Option<Vec<SoundOption>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gongs: Option<Vec<GongOption>>,
}

impl ResponseData {
    /// Payload describing only the session state machine
    pub fn from_session(state: &SessionState) -> Self {
        Self {
            state: Some(state.phase.name().to_string()),
            remaining_seconds: state.remaining_seconds(),
            elapsed_seconds: state.elapsed_seconds(),
            next_gong_seconds: state.next_gong_seconds(),
            ..Self::default()
        }
    }

    /// Full status payload: session state, options and preferences
    pub fn full_status(state: &SessionState, options: &SessionOptions, dark_mode: bool) -> Self {
        Self {
            sound: Some(options.sound.clone()),
            gong: Some(options.gong.clone()),
            ambient_volume: Some(options.ambient_volume),
            gong_volume: Some(options.gong_volume),
            duration_minutes: Some(options.duration_minutes),
            interval_minutes: Some(options.interval_minutes),
            gong_start: Some(options.moments.start),
            gong_end: Some(options.moments.end),
            dark_mode: Some(dark_mode),
            ..Self::from_session(state)
        }
    }

    pub fn sound_list(sounds: Vec<SoundOption>, selected: &str) -> Self {
        Self {
            sounds: Some(sounds),
            sound: Some(selected.to_string()),
            ..Self::default()
        }
    }

    pub fn gong_list(gongs: Vec<GongOption>, selected: &str) -> Self {
        Self {
            gongs: Some(gongs),
            gong: Some(selected.to_string()),
            ..Self::default()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ------------------------------------------------------------------------
    // SessionConfig tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_default_config_is_valid() {
        let config = SessionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sound, SILENCE_SOUND_ID);
        assert_eq!(config.gong, "gong1");
        assert_eq!(config.duration_minutes, 10);
        assert_eq!(config.interval_minutes, 0);
        assert!(!config.moments.start);
        assert!(!config.moments.end);
    }

    #[test]
    fn test_config_validate_rejects_bad_volumes() {
        let mut config = SessionConfig::default();
        config.ambient_volume = 1.5;
        assert!(config.validate().is_err());

        let mut config = SessionConfig::default();
        config.gong_volume = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validate_rejects_excessive_duration() {
        let mut config = SessionConfig::default();
        config.duration_minutes = MAX_DURATION_MINUTES + 1;
        assert!(config.validate().is_err());

        config.duration_minutes = MAX_DURATION_MINUTES;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_initial_gong_countdown() {
        let mut config = SessionConfig::default();
        config.interval_minutes = 0;
        assert_eq!(config.initial_gong_countdown(), None);

        config.interval_minutes = 5;
        assert_eq!(config.initial_gong_countdown(), Some(300));
    }

    // ------------------------------------------------------------------------
    // SessionOptions tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_options_snapshot_matches_fields() {
        let mut options = SessionOptions::new();
        options.sound = "rain".to_string();
        options.duration_minutes = 20;
        options.moments.end = true;

        let config = options.snapshot();
        assert_eq!(config.sound, "rain");
        assert_eq!(config.duration_minutes, 20);
        assert!(config.moments.end);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_set_duration_accepts_presets_and_zero() {
        let mut options = SessionOptions::new();
        for minutes in DURATION_CHOICES {
            assert!(options.set_duration(minutes));
            assert_eq!(options.duration_minutes, minutes);
        }
    }

    #[test]
    fn test_set_duration_rejects_out_of_range() {
        let mut options = SessionOptions::new();
        assert!(!options.set_duration(MAX_DURATION_MINUTES + 1));
        assert_eq!(options.duration_minutes, 10);
    }

    #[test]
    fn test_set_custom_duration_accepts_valid_minutes() {
        let mut options = SessionOptions::new();
        assert!(options.set_custom_duration("7"));
        assert_eq!(options.duration_minutes, 7);
        assert!(options.set_custom_duration(" 180 "));
        assert_eq!(options.duration_minutes, 180);
        assert!(options.set_custom_duration("1"));
        assert_eq!(options.duration_minutes, 1);
    }

    #[test]
    fn test_set_custom_duration_rejects_silently() {
        let mut options = SessionOptions::new();
        for raw in ["0", "181", "abc", "-5", "", "3.5", "10m"] {
            assert!(!options.set_custom_duration(raw), "accepted {raw:?}");
            assert_eq!(options.duration_minutes, 10, "mutated by {raw:?}");
        }
    }

    #[test]
    fn test_set_interval_bounds() {
        let mut options = SessionOptions::new();
        assert!(options.set_interval(30).is_ok());
        assert_eq!(options.interval_minutes, 30);
        assert!(options.set_interval(0).is_ok());
        assert!(options.set_interval(MAX_DURATION_MINUTES + 1).is_err());
        assert_eq!(options.interval_minutes, 0);
    }

    #[test]
    fn test_volume_setters_clamp() {
        let mut options = SessionOptions::new();
        assert_eq!(options.set_ambient_volume(1.8), 1.0);
        assert_eq!(options.set_ambient_volume(-0.3), 0.0);
        assert_eq!(options.set_gong_volume(0.25), 0.25);
    }

    #[test]
    fn test_volume_setters_ignore_non_finite() {
        let mut options = SessionOptions::new();
        assert_eq!(options.set_ambient_volume(f32::NAN), 0.5);
        assert_eq!(options.set_gong_volume(f32::INFINITY), 0.7);
    }

    #[test]
    fn test_set_moments_partial_update() {
        let mut options = SessionOptions::new();
        options.set_moments(Some(true), None);
        assert!(options.moments.start);
        assert!(!options.moments.end);
        options.set_moments(None, Some(true));
        assert!(options.moments.start);
        assert!(options.moments.end);
    }

    // ------------------------------------------------------------------------
    // SessionClock tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_clock_counts_down_for_bounded_sessions() {
        let mut clock = SessionClock::for_duration(5);
        assert_eq!(clock.remaining(), Some(300));
        clock.advance();
        assert_eq!(clock.remaining(), Some(299));
        assert!(!clock.is_exhausted());
    }

    #[test]
    fn test_clock_counts_up_for_unbounded_sessions() {
        let mut clock = SessionClock::for_duration(0);
        assert_eq!(clock.elapsed(), Some(0));
        assert_eq!(clock.remaining(), None);
        for _ in 0..90 {
            clock.advance();
        }
        assert_eq!(clock.elapsed(), Some(90));
        assert!(!clock.is_exhausted());
    }

    #[test]
    fn test_clock_exhaustion() {
        let mut clock = SessionClock::Down {
            remaining_seconds: 1,
        };
        clock.advance();
        assert!(clock.is_exhausted());
        // advancing past zero saturates
        clock.advance();
        assert_eq!(clock.remaining(), Some(0));
    }

    // ------------------------------------------------------------------------
    // SessionPhase tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_phase_names() {
        assert_eq!(SessionPhase::Idle.name(), "idle");
        assert_eq!(
            SessionPhase::Preparing {
                remaining_seconds: 3
            }
            .name(),
            "preparing"
        );
        assert_eq!(SessionPhase::Finished.name(), "finished");
    }

    #[test]
    fn test_phase_predicates() {
        let running = SessionPhase::Running {
            clock: SessionClock::for_duration(5),
            next_gong_seconds: None,
        };
        assert!(running.is_in_session());
        assert!(running.is_counting());
        assert!(!running.can_configure());

        let paused = SessionPhase::Paused {
            clock: SessionClock::for_duration(5),
            next_gong_seconds: None,
        };
        assert!(paused.is_in_session());
        assert!(!paused.is_counting());

        assert!(SessionPhase::Idle.can_configure());
        assert!(SessionPhase::Finished.can_configure());
        assert!(!SessionPhase::Finished.is_in_session());
    }

    // ------------------------------------------------------------------------
    // SessionState reducer tests
    // ------------------------------------------------------------------------

    fn config_with(duration_minutes: u32, interval_minutes: u32) -> SessionConfig {
        let mut config = SessionConfig::default();
        config.duration_minutes = duration_minutes;
        config.interval_minutes = interval_minutes;
        config
    }

    fn started_state(duration_minutes: u32, interval_minutes: u32) -> SessionState {
        let mut state = SessionState::new();
        state
            .start(config_with(duration_minutes, interval_minutes), 1)
            .unwrap();
        // one tick consumes the single preparation second
        assert_eq!(state.tick(), TickEffect::SessionBegan);
        state
    }

    #[test]
    fn test_start_enters_preparation() {
        let mut state = SessionState::new();
        state.start(config_with(10, 0), 10).unwrap();
        assert_eq!(
            state.phase,
            SessionPhase::Preparing {
                remaining_seconds: 10
            }
        );
        assert_eq!(state.remaining_seconds(), Some(10));
    }

    #[test]
    fn test_start_clamps_zero_preparation_to_one_second() {
        let mut state = SessionState::new();
        state.start(config_with(10, 0), 0).unwrap();
        assert_eq!(
            state.phase,
            SessionPhase::Preparing {
                remaining_seconds: 1
            }
        );
    }

    #[test]
    fn test_start_rejected_while_in_session() {
        let mut state = SessionState::new();
        state.start(config_with(10, 0), 10).unwrap();
        assert!(state.start(config_with(5, 0), 10).is_err());

        let mut state = started_state(10, 0);
        state.pause().unwrap();
        assert!(state.start(config_with(5, 0), 10).is_err());
    }

    #[test]
    fn test_start_rejects_invalid_config() {
        let mut state = SessionState::new();
        let mut config = config_with(10, 0);
        config.ambient_volume = 2.0;
        assert!(state.start(config, 10).is_err());
        assert_eq!(state.phase, SessionPhase::Idle);
    }

    #[test]
    fn test_preparation_counts_down_then_session_begins() {
        let mut state = SessionState::new();
        state.start(config_with(5, 10), 3).unwrap();

        assert_eq!(
            state.tick(),
            TickEffect::Preparing {
                remaining_seconds: 2
            }
        );
        assert_eq!(
            state.tick(),
            TickEffect::Preparing {
                remaining_seconds: 1
            }
        );
        assert_eq!(state.tick(), TickEffect::SessionBegan);
        assert_eq!(
            state.phase,
            SessionPhase::Running {
                clock: SessionClock::Down {
                    remaining_seconds: 300
                },
                next_gong_seconds: Some(600),
            }
        );
    }

    #[test]
    fn test_unbounded_session_counts_up() {
        let mut state = started_state(0, 0);
        for _ in 0..120 {
            assert_eq!(state.tick(), TickEffect::Counted);
        }
        assert_eq!(state.elapsed_seconds(), Some(120));
        assert_eq!(state.remaining_seconds(), None);
        assert_eq!(state.next_gong_seconds(), None);
    }

    #[test]
    fn test_bounded_session_finishes_after_duration() {
        let mut state = started_state(5, 0);
        for _ in 0..299 {
            assert_eq!(state.tick(), TickEffect::Counted);
        }
        assert_eq!(state.tick(), TickEffect::Finished);
        assert_eq!(state.phase, SessionPhase::Finished);
        assert_eq!(state.remaining_seconds(), Some(0));
        // once finished, further ticks are inert
        assert_eq!(state.tick(), TickEffect::None);
    }

    #[test]
    fn test_interval_gong_fires_on_schedule() {
        // 1 minute interval inside a 5 minute session
        let mut state = started_state(5, 1);
        for round in 0..3 {
            for second in 0..59 {
                assert_eq!(
                    state.tick(),
                    TickEffect::Counted,
                    "round {round} second {second}"
                );
            }
            assert_eq!(state.tick(), TickEffect::IntervalGong, "round {round}");
            assert_eq!(state.next_gong_seconds(), Some(60));
        }
    }

    #[test]
    fn test_interval_gong_keeps_firing_in_unbounded_session() {
        let mut state = started_state(0, 1);
        let mut gongs = 0;
        for _ in 0..180 {
            if state.tick() == TickEffect::IntervalGong {
                gongs += 1;
            }
        }
        assert_eq!(gongs, 3);
    }

    #[test]
    fn test_finishing_tick_suppresses_coinciding_gong() {
        // interval equal to duration: the gong would land on the final tick
        let mut state = started_state(1, 1);
        for _ in 0..59 {
            assert_eq!(state.tick(), TickEffect::Counted);
        }
        assert_eq!(state.tick(), TickEffect::Finished);
    }

    #[test]
    fn test_gong_longer_than_session_never_fires() {
        let mut state = started_state(1, 5);
        let mut effects = Vec::new();
        loop {
            let effect = state.tick();
            effects.push(effect);
            if effect == TickEffect::Finished {
                break;
            }
        }
        assert!(!effects.contains(&TickEffect::IntervalGong));
        assert_eq!(effects.len(), 60);
    }

    #[test]
    fn test_pause_freezes_all_counters() {
        let mut state = started_state(5, 1);
        for _ in 0..30 {
            state.tick();
        }
        assert_eq!(state.remaining_seconds(), Some(270));
        assert_eq!(state.next_gong_seconds(), Some(30));

        state.pause().unwrap();
        // ticks while paused change nothing
        for _ in 0..100 {
            assert_eq!(state.tick(), TickEffect::None);
        }
        assert_eq!(state.remaining_seconds(), Some(270));
        assert_eq!(state.next_gong_seconds(), Some(30));

        state.resume().unwrap();
        assert_eq!(state.tick(), TickEffect::Counted);
        assert_eq!(state.remaining_seconds(), Some(269));
        assert_eq!(state.next_gong_seconds(), Some(29));
    }

    #[test]
    fn test_pause_requires_running_session() {
        let mut state = SessionState::new();
        assert!(state.pause().is_err());

        state.start(config_with(10, 0), 10).unwrap();
        // preparing is not pausable
        assert!(state.pause().is_err());
    }

    #[test]
    fn test_resume_requires_paused_session() {
        let mut state = started_state(10, 0);
        assert!(state.resume().is_err());
        state.pause().unwrap();
        assert!(state.resume().is_ok());
    }

    #[test]
    fn test_stop_returns_to_idle_and_zeroes_counters() {
        let mut state = started_state(5, 1);
        for _ in 0..42 {
            state.tick();
        }
        state.stop().unwrap();
        assert_eq!(state.phase, SessionPhase::Idle);
        assert_eq!(state.remaining_seconds(), Some(0));
        assert_eq!(state.next_gong_seconds(), Some(0));
    }

    #[test]
    fn test_stop_accepted_during_preparation_and_pause() {
        let mut state = SessionState::new();
        state.start(config_with(5, 0), 10).unwrap();
        assert!(state.stop().is_ok());
        assert_eq!(state.phase, SessionPhase::Idle);

        let mut state = started_state(5, 0);
        state.pause().unwrap();
        assert!(state.stop().is_ok());
    }

    #[test]
    fn test_stop_rejected_outside_sessions() {
        let mut state = SessionState::new();
        assert!(state.stop().is_err());

        let mut state = started_state(1, 0);
        for _ in 0..60 {
            state.tick();
        }
        assert_eq!(state.phase, SessionPhase::Finished);
        assert!(state.stop().is_err());
    }

    #[test]
    fn test_restart_after_finish() {
        let mut state = started_state(1, 0);
        for _ in 0..60 {
            state.tick();
        }
        assert_eq!(state.phase, SessionPhase::Finished);
        assert!(state.start(config_with(10, 5), 10).is_ok());
        assert_eq!(state.config.duration_minutes, 10);
    }

    #[test]
    fn test_config_snapshot_survives_for_whole_session() {
        let mut state = SessionState::new();
        let mut config = config_with(5, 0);
        config.sound = "ocean".to_string();
        state.start(config, 1).unwrap();
        state.tick();
        for _ in 0..150 {
            state.tick();
        }
        assert_eq!(state.config.sound, "ocean");
    }

    // ------------------------------------------------------------------------
    // IPC serialization tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_request_serialization_tags() {
        let json = serde_json::to_string(&IpcRequest::Start).unwrap();
        assert_eq!(json, r#"{"command":"start"}"#);

        let json = serde_json::to_string(&IpcRequest::TestGong).unwrap();
        assert_eq!(json, r#"{"command":"testGong"}"#);

        let json = serde_json::to_string(&IpcRequest::UseSound {
            sound_id: "rain".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"command":"useSound","soundId":"rain"}"#);
    }

    #[test]
    fn test_request_deserialization() {
        let request: IpcRequest =
            serde_json::from_str(r#"{"command":"setDuration","value":"25"}"#).unwrap();
        assert_eq!(
            request,
            IpcRequest::SetDuration {
                value: "25".to_string()
            }
        );

        let request: IpcRequest =
            serde_json::from_str(r#"{"command":"setVolume","ambient":0.4}"#).unwrap();
        assert_eq!(
            request,
            IpcRequest::SetVolume {
                ambient: Some(0.4),
                gong: None
            }
        );

        let request: IpcRequest = serde_json::from_str(r#"{"command":"setDarkMode"}"#).unwrap();
        assert_eq!(request, IpcRequest::SetDarkMode { enabled: None });
    }

    #[test]
    fn test_request_rejects_unknown_command() {
        let result = serde_json::from_str::<IpcRequest>(r#"{"command":"explode"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_response_constructors() {
        let response = IpcResponse::success("Séance démarrée", None);
        assert!(response.is_success());
        assert_eq!(response.message, "Séance démarrée");

        let response = IpcResponse::error("Une séance est déjà en cours");
        assert!(!response.is_success());
        assert_eq!(response.status, "error");
    }

    #[test]
    fn test_response_data_from_idle_session_zeroes_counters() {
        let state = SessionState::new();
        let data = ResponseData::from_session(&state);
        assert_eq!(data.state.as_deref(), Some("idle"));
        assert_eq!(data.remaining_seconds, Some(0));
        assert_eq!(data.next_gong_seconds, Some(0));
        assert_eq!(data.elapsed_seconds, None);
    }

    #[test]
    fn test_response_data_from_running_session() {
        let mut state = SessionState::new();
        state.start(config_with(5, 1), 1).unwrap();
        state.tick();
        state.tick();
        let data = ResponseData::from_session(&state);
        assert_eq!(data.state.as_deref(), Some("running"));
        assert_eq!(data.remaining_seconds, Some(299));
        assert_eq!(data.next_gong_seconds, Some(59));
    }

    #[test]
    fn test_response_data_omits_absent_fields_on_the_wire() {
        let state = SessionState::new();
        let json = serde_json::to_string(&ResponseData::from_session(&state)).unwrap();
        assert!(json.contains("remainingSeconds"));
        assert!(!json.contains("elapsedSeconds"));
        assert!(!json.contains("ambientVolume"));
        assert!(!json.contains("sounds"));
    }

    #[test]
    fn test_full_status_payload() {
        let mut options = SessionOptions::new();
        options.sound = "rain".to_string();
        options.moments.start = true;
        let state = SessionState::new();
        let data = ResponseData::full_status(&state, &options, true);
        assert_eq!(data.sound.as_deref(), Some("rain"));
        assert_eq!(data.gong_start, Some(true));
        assert_eq!(data.gong_end, Some(false));
        assert_eq!(data.dark_mode, Some(true));
        assert_eq!(data.duration_minutes, Some(10));
    }

    #[test]
    fn test_sound_option_wire_format() {
        let silence = SoundOption {
            value: SILENCE_SOUND_ID.to_string(),
            label: "🔇 Silence".to_string(),
            file: None,
            is_custom: false,
        };
        let json = serde_json::to_string(&silence).unwrap();
        assert!(json.contains(r#""isCustom":false"#));
        assert!(!json.contains("file"));

        let custom: SoundOption = serde_json::from_str(
            r#"{"value":"custom-17","label":"Forêt","file":"sounds/custom-17.mp3","isCustom":true}"#,
        )
        .unwrap();
        assert!(custom.is_custom);
        assert_eq!(custom.file.as_deref(), Some("sounds/custom-17.mp3"));
    }

    #[test]
    fn test_sound_option_is_custom_defaults_to_false() {
        let parsed: SoundOption =
            serde_json::from_str(r#"{"value":"rain","label":"🌧️ Pluie"}"#).unwrap();
        assert!(!parsed.is_custom);
    }

    #[test]
    fn test_ipc_response_roundtrip() {
        let response = IpcResponse::success(
            "Statut",
            Some(ResponseData::full_status(
                &SessionState::new(),
                &SessionOptions::new(),
                false,
            )),
        );
        let json = serde_json::to_string(&response).unwrap();
        let parsed: IpcResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, response);
    }
}
