//! Meditation timer CLI
//!
//! A meditation timer for the terminal. A local daemon keeps the
//! session clock and plays ambient sounds and gongs; this binary sends
//! it commands over a Unix socket.

use anyhow::Result;
use clap::{CommandFactory, Parser};

use meditimer::cli::{Cli, Commands, DarkModeArg, Display, IpcClient};
use meditimer::daemon::{self, DaemonOptions};

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize logging
    init_tracing();

    // Parse command line arguments
    let cli = Cli::parse();

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&e.to_string());
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    if cli.verbose {
        tracing::info!("Mode verbeux activé");
    }

    match cli.command {
        Some(Commands::Start) => {
            let client = IpcClient::new()?;
            let response = client.start().await?;
            Display::show_start_success(&response);
        }
        Some(Commands::Pause) => {
            let client = IpcClient::new()?;
            let response = client.pause().await?;
            Display::show_pause_success(&response);
        }
        Some(Commands::Resume) => {
            let client = IpcClient::new()?;
            let response = client.resume().await?;
            Display::show_resume_success(&response);
        }
        Some(Commands::Stop) => {
            let client = IpcClient::new()?;
            let response = client.stop().await?;
            Display::show_stop_success(&response);
        }
        Some(Commands::Status) => {
            let client = IpcClient::new()?;
            let response = client.status().await?;
            Display::show_status(&response);
        }
        Some(Commands::Sounds) => {
            let client = IpcClient::new()?;
            let response = client.sounds().await?;
            Display::show_sounds(&response);
        }
        Some(Commands::Gongs) => {
            let client = IpcClient::new()?;
            let response = client.gongs().await?;
            Display::show_gongs(&response);
        }
        Some(Commands::UseSound { sound_id }) => {
            let client = IpcClient::new()?;
            let response = client.use_sound(&sound_id).await?;
            Display::show_message(&response);
        }
        Some(Commands::UseGong { gong_id }) => {
            let client = IpcClient::new()?;
            let response = client.use_gong(&gong_id).await?;
            Display::show_message(&response);
        }
        Some(Commands::AddSound { path }) => {
            let client = IpcClient::new()?;
            let response = client.add_sound(&path).await?;
            Display::show_message(&response);
        }
        Some(Commands::RemoveSound { sound_id, yes }) => {
            let client = IpcClient::new()?;
            remove_sound(&client, &sound_id, yes).await?;
        }
        Some(Commands::Volume { ambient, gong }) => {
            if ambient.is_none() && gong.is_none() {
                anyhow::bail!("Précisez --ambient ou --gong");
            }
            let client = IpcClient::new()?;
            let response = client.set_volume(ambient, gong).await?;
            Display::show_message(&response);
        }
        Some(Commands::Duration { minutes }) => {
            let client = IpcClient::new()?;
            let response = client.set_duration(&minutes).await?;
            Display::show_message(&response);
        }
        Some(Commands::Interval { minutes }) => {
            let client = IpcClient::new()?;
            let response = client.set_interval(minutes).await?;
            Display::show_message(&response);
        }
        Some(Commands::Moments { start, end }) => {
            if start.is_none() && end.is_none() {
                anyhow::bail!("Précisez --start ou --end");
            }
            let client = IpcClient::new()?;
            let response = client.set_moments(start, end).await?;
            Display::show_message(&response);
        }
        Some(Commands::TestGong) => {
            let client = IpcClient::new()?;
            let response = client.test_gong().await?;
            Display::show_message(&response);
        }
        Some(Commands::DarkMode { state }) => {
            let client = IpcClient::new()?;
            match state {
                None => {
                    let response = client.status().await?;
                    let enabled = response
                        .data
                        .as_ref()
                        .and_then(|data| data.dark_mode)
                        .unwrap_or(false);
                    println!(
                        "Mode sombre : {}",
                        if enabled { "activé" } else { "désactivé" }
                    );
                }
                Some(choice) => {
                    let enabled = match choice {
                        DarkModeArg::On => Some(true),
                        DarkModeArg::Off => Some(false),
                        DarkModeArg::Toggle => None,
                    };
                    let response = client.set_dark_mode(enabled).await?;
                    Display::show_message(&response);
                }
            }
        }
        Some(Commands::Daemon(args)) => {
            let options = DaemonOptions::resolve(
                args.socket,
                args.data_dir,
                args.preparation,
                args.preview_window,
            )?;
            daemon::run(options).await?;
        }
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
        }
        None => {
            // No command provided, show help
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

/// Removes a custom sound, asking for confirmation unless `--yes` was
/// given. The catalog is consulted first so the prompt can name the
/// sound by its label.
async fn remove_sound(client: &IpcClient, sound_id: &str, yes: bool) -> Result<()> {
    if !yes {
        let sounds = client.sounds().await?;
        let label = sounds
            .data
            .as_ref()
            .and_then(|data| data.sounds.as_ref())
            .and_then(|list| list.iter().find(|sound| sound.value == sound_id))
            .map(|sound| sound.label.clone())
            .unwrap_or_else(|| sound_id.to_string());

        if !Display::confirm(&format!("Supprimer « {label} » ?")) {
            println!("Suppression annulée");
            return Ok(());
        }
    }

    let response = client.remove_sound(sound_id).await?;
    Display::show_message(&response);
    Ok(())
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================
