//! Session engine: state transitions plus their observable events.
//!
//! The engine owns the [`SessionState`] reducer and turns its transitions
//! into [`SessionEvent`]s on an unbounded channel. Audio never happens
//! here; the daemon's event bridge subscribes to the channel and drives
//! the player, which keeps this module synchronous and fully testable.

use anyhow::{bail, Context, Result};
use tokio::sync::mpsc;
use tracing::debug;

use crate::types::{SessionConfig, SessionState, TickEffect};

/// Events emitted by the engine as a session advances.
///
/// The config snapshot rides along on the events that trigger sounds, so
/// consumers never have to reach back into the engine for it.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A session was accepted and its preparation countdown started
    PreparationStarted { seconds: u32 },
    /// Preparation ended, the session proper began
    Started { config: SessionConfig },
    /// The periodic gong is due
    IntervalGong { config: SessionConfig },
    /// A bounded session ran to completion
    Finished { config: SessionConfig },
    /// The running session was frozen
    Paused,
    /// The paused session picked up where it left off
    Resumed,
    /// The session was abandoned
    Stopped,
}

/// Drives the session state machine and publishes its events.
#[derive(Debug)]
pub struct SessionEngine {
    state: SessionState,
    preparation_seconds: u32,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
}

impl SessionEngine {
    pub fn new(preparation_seconds: u32, event_tx: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self {
            state: SessionState::new(),
            preparation_seconds,
            event_tx,
        }
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Starts a session from the given config snapshot.
    pub fn start(&mut self, config: SessionConfig) -> Result<()> {
        if let Err(message) = self.state.start(config, self.preparation_seconds) {
            bail!(message);
        }
        let seconds = self
            .state
            .remaining_seconds()
            .unwrap_or(self.preparation_seconds);
        self.event_tx
            .send(SessionEvent::PreparationStarted { seconds })
            .context("Échec d'envoi de l'événement de préparation")?;
        debug!("Séance acceptée, préparation de {seconds}s");
        Ok(())
    }

    /// Freezes the running session.
    pub fn pause(&mut self) -> Result<()> {
        if let Err(message) = self.state.pause() {
            bail!(message);
        }
        self.event_tx
            .send(SessionEvent::Paused)
            .context("Échec d'envoi de l'événement de pause")?;
        debug!("Séance mise en pause");
        Ok(())
    }

    /// Resumes the paused session.
    pub fn resume(&mut self) -> Result<()> {
        if let Err(message) = self.state.resume() {
            bail!(message);
        }
        self.event_tx
            .send(SessionEvent::Resumed)
            .context("Échec d'envoi de l'événement de reprise")?;
        debug!("Séance reprise");
        Ok(())
    }

    /// Abandons the current session.
    pub fn stop(&mut self) -> Result<()> {
        if let Err(message) = self.state.stop() {
            bail!(message);
        }
        self.event_tx
            .send(SessionEvent::Stopped)
            .context("Échec d'envoi de l'événement d'arrêt")?;
        debug!("Séance arrêtée");
        Ok(())
    }

    /// Advances the state machine by one second and publishes whatever
    /// the tick produced.
    pub fn tick(&mut self) -> Result<()> {
        match self.state.tick() {
            TickEffect::None | TickEffect::Counted => {}
            TickEffect::Preparing { remaining_seconds } => {
                debug!("Préparation : {remaining_seconds}s");
            }
            TickEffect::SessionBegan => {
                self.event_tx
                    .send(SessionEvent::Started {
                        config: self.state.config.clone(),
                    })
                    .context("Échec d'envoi de l'événement de début de séance")?;
            }
            TickEffect::IntervalGong => {
                self.event_tx
                    .send(SessionEvent::IntervalGong {
                        config: self.state.config.clone(),
                    })
                    .context("Échec d'envoi de l'événement de gong périodique")?;
            }
            TickEffect::Finished => {
                self.event_tx
                    .send(SessionEvent::Finished {
                        config: self.state.config.clone(),
                    })
                    .context("Échec d'envoi de l'événement de fin de séance")?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
