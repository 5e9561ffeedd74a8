//! Daemon for the meditation timer.
//!
//! This module contains the long-running half of the application:
//! - `session`: session engine with state transitions and events
//! - `preview`: ambient sound previews with auto-stop
//! - `ipc`: Unix socket server and request handling
//!
//! Everything mutable lives in one [`DaemonState`] behind a single async
//! mutex: the one-second ticker, the event bridge and the request
//! handler each take the lock, do their synchronous work and release it.
//! With the daemon on a current-thread runtime this makes every action
//! atomic with respect to the others.

pub mod ipc;
pub mod preview;
pub mod session;

pub use session::{SessionEngine, SessionEvent};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, Mutex};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::picker::FilePicker;
use crate::prefs::DarkModePrefs;
use crate::sound::catalog::{find_gong, SoundLibrary};
use crate::sound::{AudioPlayer, RodioAudioPlayer, SoundError};
use crate::storage::{DocumentStore, FsDocumentStore};
use crate::types::{
    ResponseData, SessionOptions, SoundOption, DURATION_CHOICES, SILENCE_SOUND_ID,
};

use ipc::{IpcServer, RequestHandler};
use preview::PreviewEngine;

/// Logs and drops a playback failure; sound problems never abort the
/// action that caused them.
fn log_playback(result: Result<(), SoundError>) {
    if let Err(e) = result {
        warn!("Commande audio ignorée : {e}");
    }
}

// ============================================================================
// DaemonState
// ============================================================================

/// All mutable daemon state plus the actions the IPC surface exposes.
///
/// The methods here are the application semantics; the request handler
/// only translates IPC requests into calls on this struct.
pub struct DaemonState {
    pub engine: SessionEngine,
    pub options: SessionOptions,
    pub library: SoundLibrary,
    pub prefs: DarkModePrefs,
    pub preview: PreviewEngine,
    store: Box<dyn DocumentStore>,
    player: Arc<dyn AudioPlayer>,
}

impl DaemonState {
    pub fn new(
        preparation_seconds: u32,
        preview_window: Duration,
        data_dir: PathBuf,
        store: Box<dyn DocumentStore>,
        player: Arc<dyn AudioPlayer>,
        event_tx: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        let library = SoundLibrary::load(store.as_ref(), data_dir);
        let prefs = DarkModePrefs::load(store.as_ref());
        let preview = PreviewEngine::new(Arc::clone(&player), preview_window);
        Self {
            engine: SessionEngine::new(preparation_seconds, event_tx),
            options: SessionOptions::new(),
            library,
            prefs,
            preview,
            store,
            player,
        }
    }

    // ------------------------------------------------------------------------
    // Session actions
    // ------------------------------------------------------------------------

    /// Starts a session from the current options and silences any
    /// preview immediately.
    pub fn start_session(&mut self) -> Result<()> {
        let config = self.options.snapshot();
        self.engine.start(config)?;
        self.preview.stop(false);
        Ok(())
    }

    pub fn pause_session(&mut self) -> Result<()> {
        self.engine.pause()
    }

    pub fn resume_session(&mut self) -> Result<()> {
        self.engine.resume()
    }

    pub fn stop_session(&mut self) -> Result<()> {
        self.engine.stop()
    }

    // ------------------------------------------------------------------------
    // Option actions
    // ------------------------------------------------------------------------

    /// Selects an ambient sound and previews it when no session is
    /// running. Selecting silence fades the current preview out.
    pub fn select_sound(&mut self, id: &str) -> Result<(), String> {
        if !self.library.contains(id) {
            return Err(format!("Son inconnu : {id}"));
        }
        self.options.sound = id.to_string();
        if self.engine.state().phase.can_configure() {
            match self.library.ambient_track(id) {
                Some(track) => self.preview.play_ambient(&track, self.options.ambient_volume),
                None => self.preview.stop(true),
            }
        }
        Ok(())
    }

    /// Selects a gong and strikes it once as a preview when no session
    /// is running.
    pub fn select_gong(&mut self, id: &str) -> Result<(), String> {
        if find_gong(id).is_none() {
            return Err(format!("Gong inconnu : {id}"));
        }
        self.options.gong = id.to_string();
        if self.engine.state().phase.can_configure() {
            let track = self.library.gong_track(id);
            self.preview.play_gong(&track, self.options.gong_volume);
        }
        Ok(())
    }

    /// Applies volume changes to the stored options and to whatever is
    /// currently audible. Volume is the one setting that reaches a
    /// running session.
    pub fn set_volumes(&mut self, ambient: Option<f32>, gong: Option<f32>) {
        if let Some(volume) = ambient {
            let applied = self.options.set_ambient_volume(volume);
            log_playback(self.player.set_ambient_volume(applied));
            self.preview.set_volume(applied);
        }
        if let Some(volume) = gong {
            let applied = self.options.set_gong_volume(volume);
            log_playback(self.player.set_gong_volume(applied));
        }
    }

    /// Applies raw duration input: preset values directly, anything else
    /// through the custom path. Bad input is dropped without feedback.
    pub fn set_duration_input(&mut self, raw: &str) {
        let accepted = match raw.trim().parse::<u32>() {
            Ok(minutes) if DURATION_CHOICES.contains(&minutes) => {
                self.options.set_duration(minutes)
            }
            _ => self.options.set_custom_duration(raw),
        };
        if !accepted {
            debug!("Durée ignorée : {raw:?}");
        }
    }

    pub fn set_interval(&mut self, minutes: u32) -> Result<(), String> {
        self.options.set_interval(minutes)
    }

    pub fn set_moments(&mut self, start: Option<bool>, end: Option<bool>) {
        self.options.set_moments(start, end);
    }

    /// Strikes the selected gong at the current gong volume.
    pub fn test_gong(&mut self) -> Result<(), String> {
        if !self.engine.state().phase.can_configure() {
            return Err("Aperçu du gong indisponible pendant une séance".to_string());
        }
        let track = self.library.gong_track(&self.options.gong);
        self.preview.play_gong(&track, self.options.gong_volume);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Catalog actions
    // ------------------------------------------------------------------------

    /// Imports a sound, selects it and previews it like any selection.
    pub fn add_sound(&mut self, picker: &dyn FilePicker) -> Option<SoundOption> {
        let added = self.library.add_custom(picker, self.store.as_ref())?;
        self.options.sound = added.value.clone();
        if self.engine.state().phase.can_configure() {
            if let Some(track) = self.library.ambient_track(&added.value) {
                self.preview.play_ambient(&track, self.options.ambient_volume);
            }
        }
        Some(added)
    }

    /// Removes a custom sound; if it was selected the selection falls
    /// back to silence.
    pub fn remove_sound(&mut self, id: &str) -> Result<SoundOption, String> {
        let removed = self.library.remove_custom(id, self.store.as_ref())?;
        if self.options.sound == removed.value {
            self.options.sound = SILENCE_SOUND_ID.to_string();
            if self.engine.state().phase.can_configure() {
                self.preview.stop(true);
            }
        }
        Ok(removed)
    }

    // ------------------------------------------------------------------------
    // Preference actions
    // ------------------------------------------------------------------------

    /// Sets or toggles dark mode and returns the new value.
    pub fn set_dark_mode(&mut self, enabled: Option<bool>) -> bool {
        match enabled {
            Some(on) => self.prefs.set(on, self.store.as_ref()),
            None => self.prefs.toggle(self.store.as_ref()),
        }
    }

    #[must_use]
    pub fn status_data(&self) -> ResponseData {
        ResponseData::full_status(self.engine.state(), &self.options, self.prefs.is_dark)
    }

    // ------------------------------------------------------------------------
    // Event handling
    // ------------------------------------------------------------------------

    /// Turns a session event into sound. Gongs and the ambient track
    /// come from the session's config snapshot; volumes are read live
    /// from the options.
    pub fn handle_session_event(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::PreparationStarted { seconds } => {
                info!("Préparation : la séance commence dans {seconds}s");
            }
            SessionEvent::Started { config } => {
                match config.duration_minutes {
                    0 => info!("Séance démarrée (durée illimitée)"),
                    minutes => info!("Séance démarrée ({minutes} min)"),
                }
                if config.moments.start {
                    let track = self.library.gong_track(&config.gong);
                    log_playback(self.player.play_gong(&track, self.options.gong_volume));
                }
                if let Some(track) = self.library.ambient_track(&config.sound) {
                    log_playback(
                        self.player
                            .play_ambient(&track, self.options.ambient_volume),
                    );
                }
            }
            SessionEvent::IntervalGong { config } => {
                debug!("Gong périodique");
                let track = self.library.gong_track(&config.gong);
                log_playback(self.player.play_gong(&track, self.options.gong_volume));
            }
            SessionEvent::Finished { config } => {
                info!("Séance terminée");
                log_playback(self.player.stop_ambient());
                if config.moments.end {
                    let track = self.library.gong_track(&config.gong);
                    log_playback(self.player.play_gong(&track, self.options.gong_volume));
                }
            }
            SessionEvent::Paused => log_playback(self.player.pause_ambient()),
            SessionEvent::Resumed => log_playback(self.player.resume_ambient()),
            SessionEvent::Stopped => log_playback(self.player.stop_ambient()),
        }
    }
}

// ============================================================================
// Daemon tasks
// ============================================================================

/// Advances the session once per second while a counting phase is
/// active.
pub async fn run_ticker(state: Arc<Mutex<DaemonState>>) -> Result<()> {
    let mut ticker = interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        let mut state = state.lock().await;
        if !state.engine.state().phase.is_counting() {
            continue;
        }
        state.engine.tick()?;
    }
}

/// Feeds engine events into the audio side of the state.
pub async fn run_event_bridge(
    mut events: mpsc::UnboundedReceiver<SessionEvent>,
    state: Arc<Mutex<DaemonState>>,
) {
    while let Some(event) = events.recv().await {
        let mut state = state.lock().await;
        state.handle_session_event(&event);
    }
}

// ============================================================================
// Daemon entry point
// ============================================================================

/// Resolved settings the daemon runs with.
#[derive(Debug, Clone)]
pub struct DaemonOptions {
    pub socket_path: PathBuf,
    pub data_dir: PathBuf,
    pub preparation_seconds: u32,
    pub preview_seconds: u64,
}

impl DaemonOptions {
    /// Fills unset paths with their platform defaults.
    pub fn resolve(
        socket: Option<PathBuf>,
        data_dir: Option<PathBuf>,
        preparation_seconds: u32,
        preview_seconds: u64,
    ) -> Result<Self> {
        let socket_path = match socket {
            Some(path) => path,
            None => ipc::default_socket_path()?,
        };
        let data_dir = match data_dir {
            Some(path) => path,
            None => dirs::data_dir()
                .context("Impossible de déterminer le répertoire de données")?
                .join("meditimer"),
        };
        Ok(Self {
            socket_path,
            data_dir,
            preparation_seconds,
            preview_seconds,
        })
    }
}

/// Runs the daemon until Ctrl-C.
pub async fn run(options: DaemonOptions) -> Result<()> {
    info!("Démarrage du démon meditimer");

    let store = FsDocumentStore::new(options.data_dir.clone())?;
    let player: Arc<dyn AudioPlayer> = Arc::new(RodioAudioPlayer::new()?);
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let state = Arc::new(Mutex::new(DaemonState::new(
        options.preparation_seconds,
        Duration::from_secs(options.preview_seconds),
        options.data_dir.clone(),
        Box::new(store),
        player,
        event_tx,
    )));

    let server = IpcServer::new(&options.socket_path)?;
    let handler = RequestHandler::new(Arc::clone(&state));

    let ticker = tokio::spawn(run_ticker(Arc::clone(&state)));
    let bridge = tokio::spawn(run_event_bridge(event_rx, Arc::clone(&state)));

    info!("À l'écoute sur {}", options.socket_path.display());
    loop {
        tokio::select! {
            accepted = server.accept() => {
                match accepted {
                    Ok(mut stream) => {
                        match IpcServer::receive_request(&mut stream).await {
                            Ok(request) => {
                                let response = handler.handle(request).await;
                                if let Err(e) = IpcServer::send_response(&mut stream, &response).await {
                                    warn!("Envoi de la réponse impossible : {e}");
                                }
                            }
                            Err(e) => warn!("Requête invalide : {e}"),
                        }
                    }
                    Err(e) => warn!("Connexion refusée : {e}"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Arrêt du démon");
                break;
            }
        }
    }

    ticker.abort();
    bridge.abort();
    state.lock().await.preview.stop(false);
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
