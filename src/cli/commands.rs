//! Command definitions for the meditation timer CLI.
//!
//! Uses the clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// ============================================================================
// CLI Structure
// ============================================================================

/// Meditation timer CLI
#[derive(Parser, Debug)]
#[command(
    name = "meditimer",
    version,
    about = "Minuteur de méditation en ligne de commande",
    long_about = "Un minuteur de méditation pour le terminal.\n\
                  Sons d'ambiance, gongs et aperçus en direct, servis par un démon local.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start a meditation session with the current options
    Start,

    /// Pause the running session
    Pause,

    /// Resume a paused session
    Resume,

    /// Stop the current session
    Stop,

    /// Show session state and options
    Status,

    /// List the ambient sound catalog
    Sounds,

    /// List the gong catalog
    Gongs,

    /// Select an ambient sound (previews it when no session runs)
    UseSound {
        /// Catalog id of the sound
        sound_id: String,
    },

    /// Select a gong (strikes it once when no session runs)
    UseGong {
        /// Catalog id of the gong
        gong_id: String,
    },

    /// Import an audio file as a custom ambient sound
    AddSound {
        /// Path of the audio file to import
        path: PathBuf,
    },

    /// Remove a custom ambient sound
    RemoveSound {
        /// Catalog id of the custom sound
        sound_id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Adjust playback volumes
    Volume {
        /// Ambient sound volume (0.0-1.0)
        #[arg(long, value_parser = parse_volume)]
        ambient: Option<f32>,

        /// Gong volume (0.0-1.0)
        #[arg(long, value_parser = parse_volume)]
        gong: Option<f32>,
    },

    /// Set the session duration
    Duration {
        /// Length in minutes, 0 for an unlimited session (max 180)
        minutes: String,
    },

    /// Set the periodic gong interval
    Interval {
        /// Minutes between gongs, 0 disables them (max 180)
        #[arg(value_parser = clap::value_parser!(u32).range(0..=180))]
        minutes: u32,
    },

    /// Choose when the session gong plays
    Moments {
        /// Play a gong when the session starts (on/off)
        #[arg(long, value_parser = parse_on_off)]
        start: Option<bool>,

        /// Play a gong when the session ends (on/off)
        #[arg(long, value_parser = parse_on_off)]
        end: Option<bool>,
    },

    /// Strike the selected gong once
    TestGong,

    /// Show or change the dark mode preference
    DarkMode {
        /// on, off or toggle; omit to show the current state
        #[arg(value_enum)]
        state: Option<DarkModeArg>,
    },

    /// Run the daemon (background service)
    Daemon(DaemonArgs),

    /// Generate shell completion scripts
    Completions {
        /// Shell type for the completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Dark mode argument values
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DarkModeArg {
    On,
    Off,
    Toggle,
}

// ============================================================================
// Daemon Command Arguments
// ============================================================================

/// Arguments for the daemon command
#[derive(Args, Debug, Clone)]
pub struct DaemonArgs {
    /// Preparation countdown before each session, in seconds (1-60)
    #[arg(
        long,
        default_value = "10",
        value_parser = clap::value_parser!(u32).range(1..=60)
    )]
    pub preparation: u32,

    /// How long sound previews play before fading out, in seconds (1-30)
    #[arg(
        long = "preview-window",
        default_value = "8",
        value_parser = clap::value_parser!(u64).range(1..=30)
    )]
    pub preview_window: u64,

    /// Socket path (defaults to ~/.meditimer/meditimer.sock)
    #[arg(long)]
    pub socket: Option<PathBuf>,

    /// Data directory for catalogs, sounds and preferences
    #[arg(long = "data-dir")]
    pub data_dir: Option<PathBuf>,
}

impl Default for DaemonArgs {
    fn default() -> Self {
        Self {
            preparation: 10,
            preview_window: 8,
            socket: None,
            data_dir: None,
        }
    }
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Parses an on/off switch value.
fn parse_on_off(s: &str) -> Result<bool, String> {
    match s {
        "on" => Ok(true),
        "off" => Ok(false),
        other => Err(format!("Valeur invalide : {other} (attendu : on ou off)")),
    }
}

/// Parses a volume and checks its range.
fn parse_volume(s: &str) -> Result<f32, String> {
    let volume: f32 = s
        .parse()
        .map_err(|_| format!("Volume invalide : {s}"))?;
    if !(0.0..=1.0).contains(&volume) {
        return Err("Le volume doit être entre 0.0 et 1.0".to_string());
    }
    Ok(volume)
}

// ============================================================================
// Tests
// ============================================================================
