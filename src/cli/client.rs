//! IPC client for communicating with the meditation timer daemon.
//!
//! This module provides:
//! - Unix domain socket client
//! - request/response handling
//! - connection retry logic with timeouts
//!
//! Only transport failures are retried; an error reported by the daemon
//! is final and surfaces immediately.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::timeout;

use crate::daemon::ipc::default_socket_path;
use crate::types::{IpcRequest, IpcResponse};

// ============================================================================
// Constants
// ============================================================================

/// Connection timeout in seconds
const CONNECTION_TIMEOUT_SECS: u64 = 5;

/// Read/write timeout in seconds
const IO_TIMEOUT_SECS: u64 = 5;

/// Maximum response size in bytes
const MAX_RESPONSE_SIZE: usize = 65536;

/// Maximum retry attempts
const MAX_RETRIES: u32 = 3;

/// Retry delay in milliseconds (base delay, multiplied by attempt number)
const RETRY_DELAY_MS: u64 = 500;

// ============================================================================
// IpcClient
// ============================================================================

/// IPC client for daemon communication.
pub struct IpcClient {
    socket_path: PathBuf,
    /// Connection timeout
    timeout: Duration,
}

impl IpcClient {
    /// Creates a client talking to the default socket path.
    pub fn new() -> Result<Self> {
        Ok(Self::with_socket_path(default_socket_path()?))
    }

    /// Creates a client with a custom socket path.
    pub fn with_socket_path(socket_path: PathBuf) -> Self {
        Self {
            socket_path,
            timeout: Duration::from_secs(CONNECTION_TIMEOUT_SECS),
        }
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &PathBuf {
        &self.socket_path
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    pub async fn start(&self) -> Result<IpcResponse> {
        self.request(&IpcRequest::Start).await
    }

    pub async fn pause(&self) -> Result<IpcResponse> {
        self.request(&IpcRequest::Pause).await
    }

    pub async fn resume(&self) -> Result<IpcResponse> {
        self.request(&IpcRequest::Resume).await
    }

    pub async fn stop(&self) -> Result<IpcResponse> {
        self.request(&IpcRequest::Stop).await
    }

    pub async fn status(&self) -> Result<IpcResponse> {
        self.request(&IpcRequest::Status).await
    }

    pub async fn sounds(&self) -> Result<IpcResponse> {
        self.request(&IpcRequest::Sounds).await
    }

    pub async fn gongs(&self) -> Result<IpcResponse> {
        self.request(&IpcRequest::Gongs).await
    }

    pub async fn use_sound(&self, sound_id: &str) -> Result<IpcResponse> {
        self.request(&IpcRequest::UseSound {
            sound_id: sound_id.to_string(),
        })
        .await
    }

    pub async fn use_gong(&self, gong_id: &str) -> Result<IpcResponse> {
        self.request(&IpcRequest::UseGong {
            gong_id: gong_id.to_string(),
        })
        .await
    }

    pub async fn set_volume(&self, ambient: Option<f32>, gong: Option<f32>) -> Result<IpcResponse> {
        self.request(&IpcRequest::SetVolume { ambient, gong }).await
    }

    pub async fn set_duration(&self, value: &str) -> Result<IpcResponse> {
        self.request(&IpcRequest::SetDuration {
            value: value.to_string(),
        })
        .await
    }

    pub async fn set_interval(&self, minutes: u32) -> Result<IpcResponse> {
        self.request(&IpcRequest::SetInterval { minutes }).await
    }

    pub async fn set_moments(&self, start: Option<bool>, end: Option<bool>) -> Result<IpcResponse> {
        self.request(&IpcRequest::SetMoments { start, end }).await
    }

    pub async fn test_gong(&self) -> Result<IpcResponse> {
        self.request(&IpcRequest::TestGong).await
    }

    /// Imports an audio file. The path is made absolute first so the
    /// daemon resolves it independently of the client's working
    /// directory.
    pub async fn add_sound(&self, path: &Path) -> Result<IpcResponse> {
        let absolute = std::fs::canonicalize(path)
            .with_context(|| format!("Fichier introuvable : {}", path.display()))?;
        self.request(&IpcRequest::AddSound {
            path: absolute.to_string_lossy().into_owned(),
        })
        .await
    }

    pub async fn remove_sound(&self, sound_id: &str) -> Result<IpcResponse> {
        self.request(&IpcRequest::RemoveSound {
            sound_id: sound_id.to_string(),
        })
        .await
    }

    pub async fn set_dark_mode(&self, enabled: Option<bool>) -> Result<IpcResponse> {
        self.request(&IpcRequest::SetDarkMode { enabled }).await
    }

    // ------------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------------

    /// Sends a request and turns a daemon-side error into a failure.
    async fn request(&self, request: &IpcRequest) -> Result<IpcResponse> {
        let response = self.send_request_with_retry(request).await?;
        if !response.is_success() {
            anyhow::bail!("{}", response.message);
        }
        Ok(response)
    }

    /// Sends a request, retrying transport failures with a growing
    /// delay.
    async fn send_request_with_retry(&self, request: &IpcRequest) -> Result<IpcResponse> {
        let mut last_error = None;

        for attempt in 1..=MAX_RETRIES {
            match self.send_request(request).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    tracing::warn!("Requête échouée (essai {}/{}) : {}", attempt, MAX_RETRIES, e);
                    last_error = Some(e);

                    if attempt < MAX_RETRIES {
                        let delay = Duration::from_millis(RETRY_DELAY_MS * u64::from(attempt));
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(last_error.unwrap())
    }

    /// Sends a single request over a fresh connection.
    async fn send_request(&self, request: &IpcRequest) -> Result<IpcResponse> {
        let mut stream = timeout(self.timeout, UnixStream::connect(&self.socket_path))
            .await
            .context("La connexion a expiré")?
            .context("Impossible de se connecter au démon. Lancez « meditimer daemon »")?;

        let request_json =
            serde_json::to_string(request).context("Sérialisation de la requête impossible")?;

        timeout(
            Duration::from_secs(IO_TIMEOUT_SECS),
            stream.write_all(request_json.as_bytes()),
        )
        .await
        .context("L'écriture a expiré")?
        .context("Envoi de la requête impossible")?;

        timeout(Duration::from_secs(IO_TIMEOUT_SECS), stream.flush())
            .await
            .context("Le vidage du tampon a expiré")?
            .context("Vidage du tampon impossible")?;

        // Half-close to signal the end of the request
        stream
            .shutdown()
            .await
            .context("Fermeture du flux impossible")?;

        let mut buffer = vec![0u8; MAX_RESPONSE_SIZE];
        let n = timeout(
            Duration::from_secs(IO_TIMEOUT_SECS),
            stream.read(&mut buffer),
        )
        .await
        .context("La lecture a expiré")?
        .context("Réception de la réponse impossible")?;

        if n == 0 {
            anyhow::bail!("Aucune réponse du démon");
        }

        let response: IpcResponse =
            serde_json::from_slice(&buffer[..n]).context("Réponse du démon illisible")?;

        Ok(response)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResponseData;
    use tokio::net::UnixListener;

    // ------------------------------------------------------------------------
    // Helper functions
    // ------------------------------------------------------------------------

    fn create_temp_socket_path() -> PathBuf {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.sock");
        // Keep the directory so it's not deleted
        std::mem::forget(dir);
        path
    }

    fn create_mock_listener(socket_path: &Path) -> UnixListener {
        let _ = std::fs::remove_file(socket_path);
        if let Some(parent) = socket_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        UnixListener::bind(socket_path).unwrap()
    }

    /// Accepts one connection, answers with the canned response and
    /// hands back the request that was received.
    fn spawn_mock_server(
        listener: UnixListener,
        response: IpcResponse,
    ) -> tokio::task::JoinHandle<IpcRequest> {
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();

            let mut buffer = vec![0u8; 4096];
            let n = stream.read(&mut buffer).await.unwrap();
            let request: IpcRequest = serde_json::from_slice(&buffer[..n]).unwrap();

            let json = serde_json::to_vec(&response).unwrap();
            stream.write_all(&json).await.unwrap();
            stream.flush().await.unwrap();

            request
        })
    }

    // ------------------------------------------------------------------------
    // IpcClient Tests
    // ------------------------------------------------------------------------

    mod client_tests {
        use super::*;

        #[test]
        fn test_with_socket_path() {
            let path = PathBuf::from("/tmp/test.sock");
            let client = IpcClient::with_socket_path(path.clone());
            assert_eq!(client.socket_path(), &path);
        }

        #[tokio::test]
        async fn test_connection_failure() {
            let socket_path = PathBuf::from("/tmp/meditimer_absent_12345.sock");
            let client = IpcClient::with_socket_path(socket_path);

            let result = client.status().await;
            assert!(result.is_err());
        }

        #[tokio::test]
        async fn test_send_status_request() {
            let socket_path = create_temp_socket_path();
            let listener = create_mock_listener(&socket_path);

            let canned = IpcResponse::success(
                "",
                Some(ResponseData {
                    state: Some("idle".to_string()),
                    remaining_seconds: Some(0),
                    dark_mode: Some(false),
                    ..ResponseData::default()
                }),
            );
            let server = spawn_mock_server(listener, canned);

            let client = IpcClient::with_socket_path(socket_path);
            let response = client.status().await.unwrap();

            assert_eq!(response.status, "success");
            assert_eq!(response.data.unwrap().state, Some("idle".to_string()));
            assert!(matches!(server.await.unwrap(), IpcRequest::Status));
        }

        #[tokio::test]
        async fn test_start_sends_bare_command() {
            let socket_path = create_temp_socket_path();
            let listener = create_mock_listener(&socket_path);
            let server = spawn_mock_server(listener, IpcResponse::success("Séance démarrée", None));

            let client = IpcClient::with_socket_path(socket_path);
            let response = client.start().await.unwrap();

            assert_eq!(response.message, "Séance démarrée");
            assert!(matches!(server.await.unwrap(), IpcRequest::Start));
        }

        #[tokio::test]
        async fn test_use_sound_sends_id() {
            let socket_path = create_temp_socket_path();
            let listener = create_mock_listener(&socket_path);
            let server =
                spawn_mock_server(listener, IpcResponse::success("Son sélectionné : rain", None));

            let client = IpcClient::with_socket_path(socket_path);
            client.use_sound("rain").await.unwrap();

            match server.await.unwrap() {
                IpcRequest::UseSound { sound_id } => assert_eq!(sound_id, "rain"),
                other => panic!("Requête inattendue : {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_set_volume_sends_partial_update() {
            let socket_path = create_temp_socket_path();
            let listener = create_mock_listener(&socket_path);
            let server = spawn_mock_server(listener, IpcResponse::success("Volume mis à jour", None));

            let client = IpcClient::with_socket_path(socket_path);
            client.set_volume(Some(0.4), None).await.unwrap();

            match server.await.unwrap() {
                IpcRequest::SetVolume { ambient, gong } => {
                    assert_eq!(ambient, Some(0.4));
                    assert!(gong.is_none());
                }
                other => panic!("Requête inattendue : {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_set_moments_sends_partial_update() {
            let socket_path = create_temp_socket_path();
            let listener = create_mock_listener(&socket_path);
            let server = spawn_mock_server(listener, IpcResponse::success("OK", None));

            let client = IpcClient::with_socket_path(socket_path);
            client.set_moments(Some(true), None).await.unwrap();

            match server.await.unwrap() {
                IpcRequest::SetMoments { start, end } => {
                    assert_eq!(start, Some(true));
                    assert!(end.is_none());
                }
                other => panic!("Requête inattendue : {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_add_sound_sends_absolute_path() {
            let socket_path = create_temp_socket_path();
            let listener = create_mock_listener(&socket_path);
            let server = spawn_mock_server(listener, IpcResponse::success("Son ajouté : x", None));

            let file = tempfile::NamedTempFile::with_suffix(".mp3").unwrap();
            std::fs::write(file.path(), b"audio").unwrap();
            let expected = std::fs::canonicalize(file.path()).unwrap();

            let client = IpcClient::with_socket_path(socket_path);
            client.add_sound(file.path()).await.unwrap();

            match server.await.unwrap() {
                IpcRequest::AddSound { path } => {
                    assert_eq!(path, expected.to_string_lossy());
                }
                other => panic!("Requête inattendue : {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_add_sound_missing_file_fails_before_connecting() {
            // no server is listening; the error must come from the path
            // check, not from the transport
            let client = IpcClient::with_socket_path(PathBuf::from("/tmp/medi_none.sock"));
            let result = client.add_sound(Path::new("/nonexistent/audio.mp3")).await;

            let message = result.unwrap_err().to_string();
            assert!(message.contains("Fichier introuvable"));
        }

        #[tokio::test]
        async fn test_set_dark_mode_toggle_sends_null() {
            let socket_path = create_temp_socket_path();
            let listener = create_mock_listener(&socket_path);
            let server = spawn_mock_server(listener, IpcResponse::success("Mode sombre activé", None));

            let client = IpcClient::with_socket_path(socket_path);
            client.set_dark_mode(None).await.unwrap();

            match server.await.unwrap() {
                IpcRequest::SetDarkMode { enabled } => assert!(enabled.is_none()),
                other => panic!("Requête inattendue : {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_daemon_error_is_not_retried() {
            let socket_path = create_temp_socket_path();
            let listener = create_mock_listener(&socket_path);

            // a single accept is enough: a daemon-side error must not
            // trigger another attempt
            let server = spawn_mock_server(
                listener,
                IpcResponse::error("Une séance est déjà en cours"),
            );

            let client = IpcClient::with_socket_path(socket_path);
            let result = client.start().await;

            let message = result.unwrap_err().to_string();
            assert!(
                message.contains("déjà en cours"),
                "message inattendu : {message}"
            );
            server.await.unwrap();
        }
    }
}
