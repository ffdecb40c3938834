//! Session configuration loading and validation

use std::str::FromStr;
use std::time::Duration;

use crate::error::{NavError, Result};
use crate::location::{AccuracyPolicy, SimulationMode, SimulationProfile};

/// Platform capabilities a navigation session cannot run without
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Location updates continue while the app is backgrounded
    pub background_location: bool,
    /// Spoken instructions can play while the app is backgrounded
    pub background_audio: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            background_location: true,
            background_audio: true,
        }
    }
}

/// Navigation session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long organic positioning may stay unqualified before simulating
    pub poor_signal_patience: Duration,

    /// Initial simulation policy
    pub simulation_mode: SimulationMode,

    /// Initial speed multiplier, honored in `Always` mode
    pub simulation_speed_multiplier: f64,

    /// Thresholds for qualifying organic samples
    pub accuracy: AccuracyPolicy,

    /// Cadence and speeds of simulated travel
    pub simulation: SimulationProfile,

    /// Duck audio and play a cue ahead of reroutes
    pub play_reroute_cue: bool,

    /// Capacity of the command and position queues
    pub input_capacity: usize,

    /// Capacity of the outward event broadcast
    pub event_capacity: usize,

    pub capabilities: Capabilities,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poor_signal_patience: Duration::from_millis(2500),
            simulation_mode: SimulationMode::OnPoorSignal,
            simulation_speed_multiplier: 1.0,
            accuracy: AccuracyPolicy::default(),
            simulation: SimulationProfile::default(),
            play_reroute_cue: true,
            input_capacity: 64,
            event_capacity: 64,
            capabilities: Capabilities::default(),
        }
    }
}

impl SessionConfig {
    /// Load configuration from environment overrides on top of defaults
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(ms) = parse_var::<u64>(&lookup, "NAV_POOR_SIGNAL_PATIENCE_MS")? {
            config.poor_signal_patience = Duration::from_millis(ms);
        }
        if let Some(mode) = parse_var::<SimulationMode>(&lookup, "NAV_SIMULATION_MODE")? {
            config.simulation_mode = mode;
        }
        if let Some(speed) = parse_var::<f64>(&lookup, "NAV_SIMULATION_SPEED")? {
            config.simulation_speed_multiplier = speed;
        }
        if let Some(m) = parse_var::<f64>(&lookup, "NAV_QUALIFIED_ACCURACY_M")? {
            config.accuracy.qualified_max_m = m;
        }
        if let Some(m) = parse_var::<f64>(&lookup, "NAV_ROUTE_START_ACCURACY_M")? {
            config.accuracy.route_start_max_m = m;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "NAV_SIMULATION_TICK_MS")? {
            config.simulation.tick = Duration::from_millis(ms);
        }
        if let Some(cue) = parse_var::<bool>(&lookup, "NAV_PLAY_REROUTE_CUE")? {
            config.play_reroute_cue = cue;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poor_signal_patience.is_zero() {
            return Err(NavError::Config("poor signal patience must be positive".into()));
        }
        if self.simulation.tick.is_zero() {
            return Err(NavError::Config("simulation tick must be positive".into()));
        }
        if !(self.simulation_speed_multiplier.is_finite() && self.simulation_speed_multiplier > 0.0) {
            return Err(NavError::Config(format!(
                "simulation speed multiplier must be positive, got {}",
                self.simulation_speed_multiplier
            )));
        }
        let speeds = [self.simulation.min_speed_mps, self.simulation.max_speed_mps];
        if speeds.iter().any(|v| !v.is_finite())
            || self.simulation.min_speed_mps <= 0.0
            || self.simulation.max_speed_mps < self.simulation.min_speed_mps
        {
            return Err(NavError::Config("simulated speed range is invalid".into()));
        }
        let accuracy = &self.accuracy;
        let thresholds = [accuracy.qualified_max_m, accuracy.route_start_max_m];
        if thresholds.iter().any(|m| !(m.is_finite() && *m > 0.0)) {
            return Err(NavError::Config("accuracy thresholds must be positive".into()));
        }
        if accuracy.route_start_max_m > accuracy.qualified_max_m {
            return Err(NavError::Config(
                "route start accuracy must be at least as strict as the qualified threshold".into(),
            ));
        }
        if self.input_capacity == 0 || self.event_capacity == 0 {
            return Err(NavError::Config("channel capacities must be non-zero".into()));
        }
        Ok(())
    }

    /// Fail if a capability the session depends on is not declared
    pub fn check_capabilities(&self) -> Result<()> {
        if !self.capabilities.background_location {
            return Err(NavError::MissingCapability("background location updates"));
        }
        if !self.capabilities.background_audio {
            return Err(NavError::MissingCapability("background audio"));
        }
        Ok(())
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| NavError::Config(format!("{key}={raw:?}: {e}"))),
    }
}
