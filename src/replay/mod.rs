//! Scenario replay
//!
//! Drives a [`NavigationSession`] from a scripted scenario using logging
//! collaborators, so session behaviour can be exercised from a JSON file.

mod collaborators;
mod scenario;

use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::error::Result;
use crate::location::PassiveSource;
use crate::session::{Collaborators, NavigationSession, SessionHandle};
use crate::voice::{SettingsChange, VoiceSettings};

pub use collaborators::{LoggingAudio, LoggingSynthesizer, ReplayTracker};
pub use scenario::{tracker_event, ConfigOverrides, Scenario, ScriptEntry, ScriptInput, ScriptPosition};

/// A session wired for replay, plus the means to drive it
pub struct Replay {
    session: NavigationSession,
    handle: SessionHandle,
    settings_tx: broadcast::Sender<SettingsChange>,
    config: SessionConfig,
    scenario: Scenario,
}

impl Replay {
    /// Build a session for `scenario`, applying its overrides to `config`
    pub fn new(scenario: Scenario, mut config: SessionConfig) -> Result<Self> {
        scenario.config.apply(&mut config);

        let (settings_tx, settings_rx) = broadcast::channel(16);
        let collaborators = Collaborators {
            tracker: Box::new(ReplayTracker::new(scenario.indexed_route())),
            organic: Box::new(PassiveSource::default()),
            synthesizer: Box::new(LoggingSynthesizer),
            audio: Box::new(LoggingAudio),
            delegate: None,
            settings: Some(settings_rx),
            voice: VoiceSettings::default(),
        };
        let (session, handle) = NavigationSession::new(config.clone(), collaborators)?;

        Ok(Self {
            session,
            handle,
            settings_tx,
            config,
            scenario,
        })
    }

    /// Split off the session so it can be spawned; the rest plays the script
    pub fn into_parts(self) -> (NavigationSession, ScriptPlayer) {
        let player = ScriptPlayer {
            handle: self.handle,
            settings_tx: self.settings_tx,
            config: self.config,
            scenario: self.scenario,
        };
        (self.session, player)
    }
}

/// Plays a scenario script against a running session
pub struct ScriptPlayer {
    handle: SessionHandle,
    settings_tx: broadcast::Sender<SettingsChange>,
    config: SessionConfig,
    scenario: Scenario,
}

impl ScriptPlayer {
    /// Get the handle of the session being driven
    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    /// Play every script entry in order, honoring the delays
    pub async fn play(&self) -> Result<()> {
        let route = self.scenario.indexed_route();
        let policy = self.config.accuracy;

        for (index, entry) in self.scenario.script.iter().enumerate() {
            if !entry.delay().is_zero() {
                tokio::time::sleep(entry.delay()).await;
            }
            debug!(index, input = ?entry.input, "script step");

            match &entry.input {
                ScriptInput::Start => self.handle.start().await?,
                ScriptInput::Stop => self.handle.stop().await?,
                ScriptInput::SetSimulationMode { mode } => {
                    self.handle.set_simulation_mode(*mode).await?
                }
                ScriptInput::SetSpeedMultiplier { multiplier } => {
                    self.handle.set_simulation_speed_multiplier(*multiplier).await?
                }
                ScriptInput::Position(position) => {
                    self.handle.submit_position(position.to_sample(&policy)).await?
                }
                ScriptInput::Settings(change) => {
                    // No receiver left means the session already ended
                    let _ = self.settings_tx.send(*change);
                }
                ScriptInput::Status => {
                    let status = self.handle.status().await?;
                    info!(?status, "session status");
                }
                input => {
                    if let Some(event) = tracker_event(input, &route, &policy) {
                        self.handle.tracker_event(event).await?;
                    }
                }
            }
        }

        info!(steps = self.scenario.script.len(), "script finished");
        Ok(())
    }
}
