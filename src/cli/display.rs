//! Display utilities for the meditation timer CLI.
//!
//! This module formats daemon responses for the terminal:
//! - acknowledgement messages
//! - the status panel
//! - catalog listings
//! - the confirmation prompt

use crate::types::IpcResponse;

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Prints the acknowledgement carried by a response.
    pub fn show_message(response: &IpcResponse) {
        if !response.message.is_empty() {
            println!("* {}", response.message);
        }
    }

    /// Shows a session start acknowledgement with the countdown.
    pub fn show_start_success(response: &IpcResponse) {
        println!("* {}", response.message);

        if let Some(data) = &response.data {
            if let Some(remaining) = data.remaining_seconds {
                println!("  La séance commence dans {remaining}s");
            }
        }
    }

    /// Shows a pause acknowledgement with the frozen clock.
    pub fn show_pause_success(response: &IpcResponse) {
        println!("|| {}", response.message);
        Self::show_clock(response);
    }

    /// Shows a resume acknowledgement with the running clock.
    pub fn show_resume_success(response: &IpcResponse) {
        println!("> {}", response.message);
        Self::show_clock(response);
    }

    /// Shows a stop acknowledgement.
    pub fn show_stop_success(response: &IpcResponse) {
        println!("[] {}", response.message);
    }

    /// Shows the full status panel.
    pub fn show_status(response: &IpcResponse) {
        println!("Minuteur de méditation");
        println!("──────────────────────");

        let Some(data) = &response.data else {
            println!("Le démon n'a renvoyé aucune donnée");
            return;
        };

        let state = data.state.as_deref().unwrap_or("inconnu");
        println!("État : {}", Self::phase_label(state));

        match state {
            "preparing" => {
                if let Some(remaining) = data.remaining_seconds {
                    println!("La séance commence dans {remaining}s");
                }
            }
            "running" | "paused" => {
                if let Some(remaining) = data.remaining_seconds {
                    let (minutes, seconds) = Self::format_time(remaining);
                    println!("Temps restant : {minutes}:{seconds:02}");
                }
                if let Some(elapsed) = data.elapsed_seconds {
                    let (minutes, seconds) = Self::format_time(elapsed);
                    println!("Temps écoulé : {minutes}:{seconds:02}");
                }
                if let Some(next) = data.next_gong_seconds {
                    if next > 0 {
                        let (minutes, seconds) = Self::format_time(next);
                        println!("Prochain gong : {minutes}:{seconds:02}");
                    }
                }
            }
            _ => {}
        }

        if let Some(sound) = &data.sound {
            println!("Son : {sound}");
        }
        if let Some(gong) = &data.gong {
            println!("Gong : {gong}");
        }
        if let (Some(ambient), Some(gong)) = (data.ambient_volume, data.gong_volume) {
            println!(
                "Volume : ambiance {} %, gong {} %",
                Self::percent(ambient),
                Self::percent(gong)
            );
        }
        if let Some(minutes) = data.duration_minutes {
            match minutes {
                0 => println!("Durée : illimitée"),
                m => println!("Durée : {m} min"),
            }
        }
        if let Some(minutes) = data.interval_minutes {
            match minutes {
                0 => println!("Gong périodique : désactivé"),
                m => println!("Gong périodique : toutes les {m} min"),
            }
        }
        if let (Some(start), Some(end)) = (data.gong_start, data.gong_end) {
            println!(
                "Gong de début : {} / de fin : {}",
                Self::on_off(start),
                Self::on_off(end)
            );
        }
        if let Some(dark) = data.dark_mode {
            println!("Mode sombre : {}", Self::on_off(dark));
        }
    }

    /// Lists the ambient sound catalog, marking the selection.
    pub fn show_sounds(response: &IpcResponse) {
        let Some(data) = &response.data else {
            return;
        };
        let selected = data.sound.as_deref().unwrap_or("");

        println!("Sons d'ambiance :");
        for sound in data.sounds.as_deref().unwrap_or_default() {
            let marker = if sound.value == selected { '*' } else { ' ' };
            let custom = if sound.is_custom { " (personnalisé)" } else { "" };
            println!("  {marker} {} [{}]{custom}", sound.label, sound.value);
        }
    }

    /// Lists the gong catalog, marking the selection.
    pub fn show_gongs(response: &IpcResponse) {
        let Some(data) = &response.data else {
            return;
        };
        let selected = data.gong.as_deref().unwrap_or("");

        println!("Gongs :");
        for gong in data.gongs.as_deref().unwrap_or_default() {
            let marker = if gong.id == selected { '*' } else { ' ' };
            println!("  {marker} {} [{}]", gong.name, gong.id);
        }
    }

    /// Shows an error message on stderr.
    pub fn show_error(message: &str) {
        eprintln!("Erreur : {message}");
    }

    /// Asks a yes/no question on the terminal; everything but an
    /// explicit yes counts as no.
    pub fn confirm(question: &str) -> bool {
        use std::io::Write;

        print!("{question} [o/N] ");
        if std::io::stdout().flush().is_err() {
            return false;
        }

        let mut answer = String::new();
        if std::io::stdin().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(
            answer.trim().to_lowercase().as_str(),
            "o" | "oui" | "y" | "yes"
        )
    }

    /// Prints the clock line shared by pause and resume output.
    fn show_clock(response: &IpcResponse) {
        if let Some(data) = &response.data {
            if let Some(remaining) = data.remaining_seconds {
                let (minutes, seconds) = Self::format_time(remaining);
                println!("  Temps restant : {minutes}:{seconds:02}");
            } else if let Some(elapsed) = data.elapsed_seconds {
                let (minutes, seconds) = Self::format_time(elapsed);
                println!("  Temps écoulé : {minutes}:{seconds:02}");
            }
        }
    }

    /// Translates a phase name for the terminal.
    fn phase_label(state: &str) -> &str {
        match state {
            "idle" => "en attente",
            "preparing" => "préparation",
            "running" => "séance en cours",
            "paused" => "en pause",
            "finished" => "terminée",
            other => other,
        }
    }

    /// Formats seconds as (minutes, seconds).
    fn format_time(total_seconds: u32) -> (u32, u32) {
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;
        (minutes, seconds)
    }

    fn percent(volume: f32) -> u32 {
        (volume * 100.0).round() as u32
    }

    fn on_off(enabled: bool) -> &'static str {
        if enabled {
            "activé"
        } else {
            "désactivé"
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
