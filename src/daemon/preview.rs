//! Ambient sound previews.
//!
//! Selecting a sound outside a session plays it immediately so the user
//! hears what they picked. A preview loops for a bounded window, then
//! fades out on its own; picking something else before the window ends
//! fades the old preview under the new one. Only one auto-stop timer is
//! ever armed: starting or stopping a preview aborts the previous timer
//! before doing anything else.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::sound::{AudioPlayer, AudioTrack};

/// Plays and schedules ambient previews.
pub struct PreviewEngine {
    player: Arc<dyn AudioPlayer>,
    window: Duration,
    stop_task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for PreviewEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewEngine")
            .field("window", &self.window)
            .field("armed", &self.stop_task.is_some())
            .finish_non_exhaustive()
    }
}

impl PreviewEngine {
    pub fn new(player: Arc<dyn AudioPlayer>, window: Duration) -> Self {
        Self {
            player,
            window,
            stop_task: None,
        }
    }

    /// Starts previewing an ambient track, fading out any current
    /// preview, and arms the auto-stop timer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn play_ambient(&mut self, track: &AudioTrack, volume: f32) {
        self.cancel_scheduled();
        if let Err(e) = self.player.play_preview(track, volume) {
            warn!("Aperçu impossible : {e}");
            return;
        }
        debug!("Aperçu de {} pendant {:?}", track.describe(), self.window);

        let player = Arc::clone(&self.player);
        let window = self.window;
        self.stop_task = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            if let Err(e) = player.stop_preview(true) {
                debug!("Arrêt de l'aperçu impossible : {e}");
            }
        }));
    }

    /// Plays the gong preview once; gongs are one-shots and need no
    /// auto-stop.
    pub fn play_gong(&self, track: &AudioTrack, volume: f32) {
        if let Err(e) = self.player.play_gong(track, volume) {
            warn!("Aperçu du gong impossible : {e}");
        }
    }

    /// Stops the current preview, with or without fade, and disarms the
    /// auto-stop timer.
    pub fn stop(&mut self, fade: bool) {
        self.cancel_scheduled();
        if let Err(e) = self.player.stop_preview(fade) {
            debug!("Arrêt de l'aperçu impossible : {e}");
        }
    }

    /// Adjusts the volume of the playing preview.
    pub fn set_volume(&self, volume: f32) {
        if let Err(e) = self.player.set_preview_volume(volume) {
            debug!("Réglage du volume de l'aperçu impossible : {e}");
        }
    }

    fn cancel_scheduled(&mut self) {
        if let Some(task) = self.stop_task.take() {
            task.abort();
        }
    }
}

impl Drop for PreviewEngine {
    fn drop(&mut self) {
        self.cancel_scheduled();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sound::{AudioCall, MockAudioPlayer};
    use std::path::PathBuf;

    fn track(name: &str) -> AudioTrack {
        AudioTrack::File(PathBuf::from(format!("/data/ambient/{name}")))
    }

    #[tokio::test]
    async fn test_preview_stops_itself_after_window() {
        let player = Arc::new(MockAudioPlayer::new());
        let mut preview = PreviewEngine::new(player.clone(), Duration::from_millis(50));

        preview.play_ambient(&track("rain.mp3"), 0.5);
        assert_eq!(player.calls().len(), 1);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(
            player.calls(),
            vec![
                AudioCall::PlayPreview {
                    track: track("rain.mp3"),
                    volume: 0.5
                },
                AudioCall::StopPreview { fade: true },
            ]
        );
    }

    #[tokio::test]
    async fn test_switching_preview_fades_old_and_rearms_timer() {
        let player = Arc::new(MockAudioPlayer::new());
        let mut preview = PreviewEngine::new(player.clone(), Duration::from_millis(100));

        preview.play_ambient(&track("rain.mp3"), 0.5);
        tokio::time::sleep(Duration::from_millis(30)).await;
        preview.play_ambient(&track("ocean.mp3"), 0.5);

        tokio::time::sleep(Duration::from_millis(200)).await;
        let stops = player
            .calls()
            .into_iter()
            .filter(|call| matches!(call, AudioCall::StopPreview { .. }))
            .count();
        // one fade from the switch, one from the second preview's timer;
        // the first preview's timer was aborted
        assert_eq!(stops, 2);
    }

    #[tokio::test]
    async fn test_explicit_stop_disarms_timer() {
        let player = Arc::new(MockAudioPlayer::new());
        let mut preview = PreviewEngine::new(player.clone(), Duration::from_millis(50));

        preview.play_ambient(&track("rain.mp3"), 0.5);
        preview.stop(false);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(
            player.calls(),
            vec![
                AudioCall::PlayPreview {
                    track: track("rain.mp3"),
                    volume: 0.5
                },
                AudioCall::StopPreview { fade: false },
            ]
        );
    }

    #[tokio::test]
    async fn test_gong_preview_is_one_shot() {
        let player = Arc::new(MockAudioPlayer::new());
        let preview = PreviewEngine::new(player.clone(), Duration::from_millis(50));

        preview.play_gong(&AudioTrack::Embedded(crate::sound::embedded_gong()), 0.7);
        tokio::time::sleep(Duration::from_millis(120)).await;
        // no stop is ever scheduled for gongs
        assert_eq!(player.gong_count(), 1);
        assert_eq!(player.call_count(), 1);
    }

    #[tokio::test]
    async fn test_playback_failure_is_swallowed() {
        let player = Arc::new(MockAudioPlayer::new());
        player.set_should_fail(true);
        let mut preview = PreviewEngine::new(player.clone(), Duration::from_millis(20));

        preview.play_ambient(&track("rain.mp3"), 0.5);
        preview.play_gong(&AudioTrack::Embedded(crate::sound::embedded_gong()), 0.7);
        preview.stop(true);
        // nothing recorded, nothing panicked
        assert_eq!(player.call_count(), 0);
    }

    #[tokio::test]
    async fn test_set_volume_reaches_player() {
        let player = Arc::new(MockAudioPlayer::new());
        let preview = PreviewEngine::new(player.clone(), Duration::from_millis(50));
        preview.set_volume(0.1);
        assert_eq!(player.calls(), vec![AudioCall::PreviewVolume(0.1)]);
    }
}
