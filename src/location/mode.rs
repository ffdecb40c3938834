//! Simulation policy types

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// When the session replaces organic positioning with simulated positioning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationMode {
    /// Simulate only after organic positioning stays poor for the patience interval
    #[default]
    OnPoorSignal,
    /// Always simulate while the session is started
    Always,
    /// Never simulate
    Never,
}

impl std::fmt::Display for SimulationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimulationMode::OnPoorSignal => write!(f, "on_poor_signal"),
            SimulationMode::Always => write!(f, "always"),
            SimulationMode::Never => write!(f, "never"),
        }
    }
}

impl FromStr for SimulationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on_poor_signal" | "onpoorsignal" | "poor_signal" => Ok(Self::OnPoorSignal),
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            other => Err(format!("unknown simulation mode: {other}")),
        }
    }
}

/// Why a simulation episode started or stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationIntent {
    Manual,
    PoorSignal,
}

/// Which source produced a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SampleOrigin {
    /// The live platform stream
    Organic,
    /// A simulated source; `epoch` identifies the simulation episode
    Simulated { epoch: u64 },
}
