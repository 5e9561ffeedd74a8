//! IPC server for the meditation timer.
//!
//! This module provides the Unix domain socket surface of the daemon:
//! - a listener bound to a well-known socket path
//! - request/response framing (single JSON document per connection)
//! - a handler that maps requests onto [`DaemonState`] actions

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Mutex;
use tokio::time::{timeout, Duration};

use crate::picker::PathPicker;
use crate::sound::catalog::builtin_gongs;
use crate::types::{IpcRequest, IpcResponse, ResponseData};

use super::DaemonState;

// ============================================================================
// Constants
// ============================================================================

/// Maximum request size in bytes
const MAX_REQUEST_SIZE: usize = 4096;

/// Read timeout in seconds
const READ_TIMEOUT_SECS: u64 = 5;

/// Default socket path, shared by the daemon and the client.
pub fn default_socket_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("Variable d'environnement HOME introuvable")?;
    Ok(PathBuf::from(home).join(".meditimer").join("meditimer.sock"))
}

// ============================================================================
// IpcError
// ============================================================================

/// IPC-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// Socket binding error
    #[error("Impossible de lier le socket : {0}")]
    Bind(String),

    /// Read error
    #[error("Lecture de la requête impossible : {0}")]
    Read(String),

    /// The peer closed the connection before sending a request
    #[error("Connexion fermée par le client")]
    ConnectionClosed,

    /// Read timeout
    #[error("Délai d'attente dépassé")]
    Timeout,

    /// Request larger than the read buffer
    #[error("Requête trop volumineuse (max {MAX_REQUEST_SIZE} octets)")]
    RequestTooLarge,
}

// ============================================================================
// IpcServer
// ============================================================================

/// Unix domain socket server.
pub struct IpcServer {
    listener: UnixListener,
    /// Socket path, kept for cleanup on drop
    socket_path: PathBuf,
}

impl IpcServer {
    /// Creates a server bound to the given socket path.
    ///
    /// A stale socket file from a previous run is removed before
    /// binding, and the parent directory is created if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound.
    pub fn new(socket_path: &Path) -> Result<Self> {
        if socket_path.exists() {
            std::fs::remove_file(socket_path).with_context(|| {
                format!("Suppression de l'ancien socket impossible : {socket_path:?}")
            })?;
        }

        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Création du répertoire du socket impossible : {parent:?}")
            })?;
        }

        let listener = UnixListener::bind(socket_path)
            .map_err(|e| IpcError::Bind(format!("{} ({e})", socket_path.display())))?;

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
        })
    }

    /// Accepts an incoming client connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be accepted.
    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .context("Acceptation de la connexion impossible")?;
        Ok(stream)
    }

    /// Receives and deserializes one request from the stream.
    ///
    /// A read timeout keeps a silent client from blocking the daemon.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or deserialization fails.
    pub async fn receive_request(stream: &mut UnixStream) -> Result<IpcRequest> {
        let mut buffer = vec![0u8; MAX_REQUEST_SIZE];

        let read_result = timeout(
            Duration::from_secs(READ_TIMEOUT_SECS),
            stream.read(&mut buffer),
        )
        .await;

        let n = match read_result {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(IpcError::Read(e.to_string()).into()),
            Err(_) => return Err(IpcError::Timeout.into()),
        };

        if n == 0 {
            return Err(IpcError::ConnectionClosed.into());
        }
        if n == buffer.len() {
            return Err(IpcError::RequestTooLarge.into());
        }

        let request: IpcRequest =
            serde_json::from_slice(&buffer[..n]).context("Requête IPC illisible")?;

        Ok(request)
    }

    /// Serializes and sends a response to the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub async fn send_response(stream: &mut UnixStream, response: &IpcResponse) -> Result<()> {
        let json =
            serde_json::to_vec(response).context("Sérialisation de la réponse impossible")?;

        stream
            .write_all(&json)
            .await
            .context("Écriture de la réponse impossible")?;
        stream
            .flush()
            .await
            .context("Vidage du tampon de réponse impossible")?;

        Ok(())
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

// ============================================================================
// RequestHandler
// ============================================================================

/// Maps IPC requests onto the daemon state.
pub struct RequestHandler {
    state: Arc<Mutex<DaemonState>>,
}

impl RequestHandler {
    pub fn new(state: Arc<Mutex<DaemonState>>) -> Self {
        Self { state }
    }

    /// Handles one request and builds the response for it.
    pub async fn handle(&self, request: IpcRequest) -> IpcResponse {
        match request {
            IpcRequest::Start => self.handle_start().await,
            IpcRequest::Pause => self.handle_pause().await,
            IpcRequest::Resume => self.handle_resume().await,
            IpcRequest::Stop => self.handle_stop().await,
            IpcRequest::Status => self.handle_status().await,
            IpcRequest::Sounds => self.handle_sounds().await,
            IpcRequest::Gongs => self.handle_gongs().await,
            IpcRequest::UseSound { sound_id } => self.handle_use_sound(sound_id).await,
            IpcRequest::UseGong { gong_id } => self.handle_use_gong(gong_id).await,
            IpcRequest::SetVolume { ambient, gong } => self.handle_set_volume(ambient, gong).await,
            IpcRequest::SetDuration { value } => self.handle_set_duration(value).await,
            IpcRequest::SetInterval { minutes } => self.handle_set_interval(minutes).await,
            IpcRequest::SetMoments { start, end } => self.handle_set_moments(start, end).await,
            IpcRequest::TestGong => self.handle_test_gong().await,
            IpcRequest::AddSound { path } => self.handle_add_sound(path).await,
            IpcRequest::RemoveSound { sound_id } => self.handle_remove_sound(sound_id).await,
            IpcRequest::SetDarkMode { enabled } => self.handle_set_dark_mode(enabled).await,
        }
    }

    async fn handle_start(&self) -> IpcResponse {
        let mut state = self.state.lock().await;
        match state.start_session() {
            Ok(()) => IpcResponse::success(
                "Séance démarrée",
                Some(ResponseData::from_session(state.engine.state())),
            ),
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    async fn handle_pause(&self) -> IpcResponse {
        let mut state = self.state.lock().await;
        match state.pause_session() {
            Ok(()) => IpcResponse::success(
                "Séance mise en pause",
                Some(ResponseData::from_session(state.engine.state())),
            ),
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    async fn handle_resume(&self) -> IpcResponse {
        let mut state = self.state.lock().await;
        match state.resume_session() {
            Ok(()) => IpcResponse::success(
                "Séance reprise",
                Some(ResponseData::from_session(state.engine.state())),
            ),
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    async fn handle_stop(&self) -> IpcResponse {
        let mut state = self.state.lock().await;
        match state.stop_session() {
            Ok(()) => IpcResponse::success(
                "Séance arrêtée",
                Some(ResponseData::from_session(state.engine.state())),
            ),
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    async fn handle_status(&self) -> IpcResponse {
        let state = self.state.lock().await;
        IpcResponse::success("", Some(state.status_data()))
    }

    async fn handle_sounds(&self) -> IpcResponse {
        let state = self.state.lock().await;
        IpcResponse::success(
            "",
            Some(ResponseData::sound_list(
                state.library.list_all(),
                &state.options.sound,
            )),
        )
    }

    async fn handle_gongs(&self) -> IpcResponse {
        let state = self.state.lock().await;
        IpcResponse::success(
            "",
            Some(ResponseData::gong_list(builtin_gongs(), &state.options.gong)),
        )
    }

    async fn handle_use_sound(&self, sound_id: String) -> IpcResponse {
        let mut state = self.state.lock().await;
        match state.select_sound(&sound_id) {
            Ok(()) => IpcResponse::success(
                format!("Son sélectionné : {sound_id}"),
                Some(state.status_data()),
            ),
            Err(message) => IpcResponse::error(message),
        }
    }

    async fn handle_use_gong(&self, gong_id: String) -> IpcResponse {
        let mut state = self.state.lock().await;
        match state.select_gong(&gong_id) {
            Ok(()) => IpcResponse::success(
                format!("Gong sélectionné : {gong_id}"),
                Some(state.status_data()),
            ),
            Err(message) => IpcResponse::error(message),
        }
    }

    async fn handle_set_volume(&self, ambient: Option<f32>, gong: Option<f32>) -> IpcResponse {
        let mut state = self.state.lock().await;
        state.set_volumes(ambient, gong);
        IpcResponse::success("Volume mis à jour", Some(state.status_data()))
    }

    async fn handle_set_duration(&self, value: String) -> IpcResponse {
        let mut state = self.state.lock().await;
        state.set_duration_input(&value);
        // the message reflects the duration actually in effect, which
        // is unchanged when the input was rejected
        let message = match state.options.duration_minutes {
            0 => "Durée : illimitée".to_string(),
            minutes => format!("Durée : {minutes} min"),
        };
        IpcResponse::success(message, Some(state.status_data()))
    }

    async fn handle_set_interval(&self, minutes: u32) -> IpcResponse {
        let mut state = self.state.lock().await;
        match state.set_interval(minutes) {
            Ok(()) => {
                let message = match minutes {
                    0 => "Gong périodique désactivé".to_string(),
                    m => format!("Gong périodique : toutes les {m} min"),
                };
                IpcResponse::success(message, Some(state.status_data()))
            }
            Err(message) => IpcResponse::error(message),
        }
    }

    async fn handle_set_moments(&self, start: Option<bool>, end: Option<bool>) -> IpcResponse {
        let mut state = self.state.lock().await;
        state.set_moments(start, end);
        IpcResponse::success(
            "Gongs de début et de fin mis à jour",
            Some(state.status_data()),
        )
    }

    async fn handle_test_gong(&self) -> IpcResponse {
        let mut state = self.state.lock().await;
        match state.test_gong() {
            Ok(()) => IpcResponse::success("Gong joué", None),
            Err(message) => IpcResponse::error(message),
        }
    }

    async fn handle_add_sound(&self, path: String) -> IpcResponse {
        let mut state = self.state.lock().await;
        let picker = PathPicker::new(path);
        match state.add_sound(&picker) {
            Some(added) => IpcResponse::success(
                format!("Son ajouté : {}", added.label),
                Some(state.status_data()),
            ),
            None => IpcResponse::success("Aucun son ajouté", None),
        }
    }

    async fn handle_remove_sound(&self, sound_id: String) -> IpcResponse {
        let mut state = self.state.lock().await;
        match state.remove_sound(&sound_id) {
            Ok(removed) => IpcResponse::success(
                format!("Son supprimé : {}", removed.label),
                Some(state.status_data()),
            ),
            Err(message) => IpcResponse::error(message),
        }
    }

    async fn handle_set_dark_mode(&self, enabled: Option<bool>) -> IpcResponse {
        let mut state = self.state.lock().await;
        let message = if state.set_dark_mode(enabled) {
            "Mode sombre activé"
        } else {
            "Mode sombre désactivé"
        };
        IpcResponse::success(message, Some(state.status_data()))
    }
}

// ============================================================================
// Tests
// ============================================================================
