//! Outward navigation events
//!
//! Everything the session reports to the application travels over a
//! broadcast channel as a [`NavigationEvent`]. Events are self-contained
//! summaries so they can be serialized for logging or IPC.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::{AudioAction, ReroutingError};
use crate::location::{Coordinate, PositionSample, SimulationIntent};
use crate::route::{IndexedRoute, RouteProgress, VisualInstruction, Waypoint};

/// Events emitted by the session as it runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NavigationEvent {
    SessionStarted,

    SessionStopped,

    WillBeginSimulating {
        intent: SimulationIntent,
        distance_traveled: f64,
    },

    DidBeginSimulating {
        intent: SimulationIntent,
        distance_traveled: f64,
    },

    WillEndSimulating {
        intent: SimulationIntent,
        distance_traveled: f64,
    },

    DidEndSimulating {
        intent: SimulationIntent,
        distance_traveled: f64,
    },

    ProgressUpdated {
        leg_index: usize,
        step_index: usize,
        distance_traveled: f64,
        distance_remaining: f64,
        location: Coordinate,
    },

    WillReroute {
        location: Coordinate,
    },

    DidReroute {
        route_index: usize,
        /// Length of the new route in meters
        distance: f64,
        proactive: bool,
        location: Option<Coordinate>,
    },

    DidFailToReroute {
        reason: String,
    },

    PassedVisualInstructionPoint {
        text: String,
        leg_index: usize,
        step_index: usize,
    },

    PassedSpokenInstructionPoint {
        /// `None` when the step has no instruction left to speak
        text: Option<String>,
        leg_index: usize,
        step_index: usize,
    },

    WillArrive {
        waypoint: String,
        eta_secs: f64,
        distance: f64,
    },

    DidArrive {
        waypoint: String,
        /// Whether the session advances to the next leg
        advanced: bool,
    },

    /// Mixing the audio session failed; the reroute cue still played
    AudioControlFailed {
        action: AudioAction,
        cause: String,
    },
}

impl NavigationEvent {
    pub fn progress_updated(progress: &RouteProgress, location: &PositionSample) -> Self {
        Self::ProgressUpdated {
            leg_index: progress.leg_index,
            step_index: progress.step_index,
            distance_traveled: progress.distance_traveled,
            distance_remaining: progress.distance_remaining(),
            location: location.coordinate,
        }
    }

    pub fn did_reroute(
        route: &IndexedRoute,
        location: Option<&PositionSample>,
        proactive: bool,
    ) -> Self {
        Self::DidReroute {
            route_index: route.index,
            distance: route.route.distance,
            proactive,
            location: location.map(|l| l.coordinate),
        }
    }

    pub fn did_fail_to_reroute(error: &ReroutingError) -> Self {
        Self::DidFailToReroute {
            reason: error.reason.clone(),
        }
    }

    pub fn passed_visual_instruction(instruction: &VisualInstruction, progress: &RouteProgress) -> Self {
        Self::PassedVisualInstructionPoint {
            text: instruction.primary_text.clone(),
            leg_index: progress.leg_index,
            step_index: progress.step_index,
        }
    }

    pub fn passed_spoken_instruction(progress: &RouteProgress) -> Self {
        Self::PassedSpokenInstructionPoint {
            text: progress.current_spoken_instruction().map(|i| i.text.clone()),
            leg_index: progress.leg_index,
            step_index: progress.step_index,
        }
    }

    pub fn did_arrive(waypoint: &Waypoint, advanced: bool) -> Self {
        Self::DidArrive {
            waypoint: waypoint.to_string(),
            advanced,
        }
    }
}

impl std::fmt::Display for NavigationEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NavigationEvent::SessionStarted => write!(f, "SESSION_STARTED"),
            NavigationEvent::SessionStopped => write!(f, "SESSION_STOPPED"),
            NavigationEvent::WillBeginSimulating { intent, .. } => {
                write!(f, "WILL_BEGIN_SIMULATING ({intent:?})")
            }
            NavigationEvent::DidBeginSimulating { intent, .. } => {
                write!(f, "DID_BEGIN_SIMULATING ({intent:?})")
            }
            NavigationEvent::WillEndSimulating { intent, .. } => {
                write!(f, "WILL_END_SIMULATING ({intent:?})")
            }
            NavigationEvent::DidEndSimulating { intent, .. } => {
                write!(f, "DID_END_SIMULATING ({intent:?})")
            }
            NavigationEvent::ProgressUpdated {
                distance_remaining, ..
            } => write!(f, "PROGRESS_UPDATED ({distance_remaining:.0}m remaining)"),
            NavigationEvent::WillReroute { .. } => write!(f, "WILL_REROUTE"),
            NavigationEvent::DidReroute { proactive, .. } => {
                write!(f, "DID_REROUTE (proactive: {proactive})")
            }
            NavigationEvent::DidFailToReroute { reason } => {
                write!(f, "DID_FAIL_TO_REROUTE ({reason})")
            }
            NavigationEvent::PassedVisualInstructionPoint { text, .. } => {
                write!(f, "PASSED_VISUAL_INSTRUCTION ({text})")
            }
            NavigationEvent::PassedSpokenInstructionPoint { text, .. } => {
                write!(f, "PASSED_SPOKEN_INSTRUCTION ({})", text.as_deref().unwrap_or("-"))
            }
            NavigationEvent::WillArrive { waypoint, .. } => write!(f, "WILL_ARRIVE ({waypoint})"),
            NavigationEvent::DidArrive { waypoint, advanced } => {
                write!(f, "DID_ARRIVE ({waypoint}, advanced: {advanced})")
            }
            NavigationEvent::AudioControlFailed { action, cause } => {
                write!(f, "AUDIO_CONTROL_FAILED ({action}: {cause})")
            }
        }
    }
}

/// Send an event, ignoring the case where nobody is subscribed
pub(crate) fn emit(event_tx: &broadcast::Sender<NavigationEvent>, event: NavigationEvent) {
    tracing::debug!(%event, "emitting navigation event");
    let _ = event_tx.send(event);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = NavigationEvent::DidReroute {
            route_index: 1,
            distance: 1500.0,
            proactive: true,
            location: None,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("did_reroute"));
        assert!(json.contains("\"proactive\":true"));
    }

    #[test]
    fn test_event_deserialization() {
        let json = r#"{"type":"will_begin_simulating","intent":"poor_signal","distance_traveled":12.5}"#;
        let event: NavigationEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event,
            NavigationEvent::WillBeginSimulating {
                intent: SimulationIntent::PoorSignal,
                distance_traveled: 12.5,
            }
        );
    }

    #[test]
    fn test_display() {
        let event = NavigationEvent::DidArrive {
            waypoint: "Home".into(),
            advanced: false,
        };
        assert_eq!(event.to_string(), "DID_ARRIVE (Home, advanced: false)");
    }
}
