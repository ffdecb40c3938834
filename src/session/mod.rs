//! Navigation session: the single owner of all coordination state
//!
//! Every input (application commands, organic samples, simulated samples,
//! timer ticks, settings changes) is serialized onto one task that runs
//! [`NavigationSession::run`]. The application talks to it through a
//! cloneable [`SessionHandle`].

mod coordinator;
mod handle;

use std::sync::Arc;

use tokio::sync::{broadcast, oneshot};

use crate::location::{PositionSample, PositionSource, SimulationMode};
use crate::relay::{AudioSession, NavigationDelegate};
use crate::route::{RouteTracker, TrackerEvent};
use crate::timer::TimerState;
use crate::voice::{SettingsChange, SpeechSynthesizer, VoiceSettings};

pub use coordinator::NavigationSession;
pub use handle::SessionHandle;

/// External components a session is wired to
pub struct Collaborators {
    pub tracker: Box<dyn RouteTracker>,
    /// Start/stop control for the platform location stream
    pub organic: Box<dyn PositionSource>,
    pub synthesizer: Box<dyn SpeechSynthesizer>,
    pub audio: Box<dyn AudioSession>,
    pub delegate: Option<Arc<dyn NavigationDelegate>>,
    /// Settings change notifications; dropped when the session ends
    pub settings: Option<broadcast::Receiver<SettingsChange>>,
    pub voice: VoiceSettings,
}

/// Snapshot of session state
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatus {
    pub started: bool,
    pub mode: SimulationMode,
    pub simulating: bool,
    /// Effective simulation speed multiplier
    pub speed_multiplier: f64,
    pub timer: TimerState,
    pub voice: VoiceSettings,
    pub last_instruction: Option<String>,
}

/// Commands queued to the session task
#[derive(Debug)]
pub(crate) enum SessionInput {
    Start,
    Stop,
    SetSimulationMode(SimulationMode),
    SetSpeedMultiplier(f64),
    OrganicPosition(PositionSample),
    Tracker(TrackerEvent),
    Status(oneshot::Sender<SessionStatus>),
    Shutdown,
}
