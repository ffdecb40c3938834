//! Scenario file model
//!
//! A scenario is a JSON document holding a route, optional config overrides
//! and a timed script of session inputs.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;
use crate::error::{ReroutingError, Result};
use crate::location::{AccuracyPolicy, Coordinate, PositionSample, SimulationMode};
use crate::route::{IndexedRoute, Route, RouteProgress, TrackerEvent};
use crate::voice::SettingsChange;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub route: Route,
    #[serde(default)]
    pub route_index: usize,
    #[serde(default)]
    pub config: ConfigOverrides,
    pub script: Vec<ScriptEntry>,
}

/// Overrides applied on top of the environment-derived config
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigOverrides {
    pub poor_signal_patience_ms: Option<u64>,
    pub simulation_mode: Option<SimulationMode>,
    pub simulation_speed_multiplier: Option<f64>,
    pub simulation_tick_ms: Option<u64>,
    pub play_reroute_cue: Option<bool>,
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut SessionConfig) {
        if let Some(ms) = self.poor_signal_patience_ms {
            config.poor_signal_patience = Duration::from_millis(ms);
        }
        if let Some(mode) = self.simulation_mode {
            config.simulation_mode = mode;
        }
        if let Some(multiplier) = self.simulation_speed_multiplier {
            config.simulation_speed_multiplier = multiplier;
        }
        if let Some(ms) = self.simulation_tick_ms {
            config.simulation.tick = Duration::from_millis(ms);
        }
        if let Some(cue) = self.play_reroute_cue {
            config.play_reroute_cue = cue;
        }
    }
}

/// One script step, run `after_ms` after the previous one
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptEntry {
    #[serde(default)]
    pub after_ms: u64,
    #[serde(flatten)]
    pub input: ScriptInput,
}

impl ScriptEntry {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.after_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptInput {
    Start,
    Stop,
    SetSimulationMode {
        mode: SimulationMode,
    },
    SetSpeedMultiplier {
        multiplier: f64,
    },
    Position(ScriptPosition),
    Settings(SettingsChange),
    SpokenInstructionPoint {
        #[serde(default)]
        leg_index: usize,
        #[serde(default)]
        step_index: usize,
        #[serde(default)]
        instruction_index: usize,
    },
    WillReroute(ScriptPosition),
    DidReroute {
        #[serde(default)]
        proactive: bool,
    },
    DidFailToReroute {
        reason: String,
    },
    /// Dump the session status to the log
    Status,
}

/// Organic sample as written in a scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptPosition {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub course: f64,
    #[serde(default)]
    pub speed: f64,
    pub accuracy: f64,
    #[serde(default = "default_vertical_accuracy")]
    pub vertical_accuracy: f64,
}

fn default_vertical_accuracy() -> f64 {
    10.0
}

impl ScriptPosition {
    pub fn to_sample(&self, policy: &AccuracyPolicy) -> PositionSample {
        PositionSample::new(
            Coordinate::new(self.latitude, self.longitude),
            self.course,
            self.speed,
            self.accuracy,
            self.vertical_accuracy,
            policy,
        )
    }
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn indexed_route(&self) -> IndexedRoute {
        IndexedRoute::new(self.route.clone(), self.route_index)
    }
}

/// Turn a tracker-side script input into the event the tracker would raise
pub fn tracker_event(
    input: &ScriptInput,
    route: &IndexedRoute,
    policy: &AccuracyPolicy,
) -> Option<TrackerEvent> {
    match input {
        ScriptInput::SpokenInstructionPoint {
            leg_index,
            step_index,
            instruction_index,
        } => {
            let mut progress = RouteProgress::new(route.clone());
            progress.leg_index = *leg_index;
            progress.step_index = *step_index;
            progress.spoken_instruction_index = *instruction_index;
            Some(TrackerEvent::PassedSpokenInstructionPoint { progress })
        }
        ScriptInput::WillReroute(position) => Some(TrackerEvent::WillReroute {
            location: position.to_sample(policy),
        }),
        ScriptInput::DidReroute { proactive } => Some(TrackerEvent::DidReroute {
            route: route.clone(),
            location: None,
            proactive: *proactive,
        }),
        ScriptInput::DidFailToReroute { reason } => Some(TrackerEvent::DidFailToReroute {
            error: ReroutingError::new(reason.clone()),
        }),
        _ => None,
    }
}
