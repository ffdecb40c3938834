//! Route tracker collaborator contract
//!
//! The tracker itself (map matching, off-route detection, progress
//! computation) lives outside this crate. It receives accepted position
//! samples and reports back through a [`TrackerDelegate`]: notifications via
//! [`TrackerDelegate::notify`], yes/no questions via [`TrackerDelegate::ask`].
//! Events that complete later (a reroute computed by the backend) can be fed
//! in through `SessionHandle::tracker_event`.

use std::time::Duration;

use crate::error::ReroutingError;
use crate::location::PositionSample;

use super::{IndexedRoute, RouteProgress, VisualInstruction, Waypoint};

/// Notifications raised by the route tracker
#[derive(Debug, Clone)]
pub enum TrackerEvent {
    ProgressUpdated {
        progress: RouteProgress,
        location: PositionSample,
    },
    WillReroute {
        location: PositionSample,
    },
    DidReroute {
        route: IndexedRoute,
        location: Option<PositionSample>,
        /// A faster route was found rather than the user leaving the route
        proactive: bool,
    },
    DidFailToReroute {
        error: ReroutingError,
    },
    PassedVisualInstructionPoint {
        instruction: VisualInstruction,
        progress: RouteProgress,
    },
    /// The current spoken instruction is `progress.current_spoken_instruction()`
    PassedSpokenInstructionPoint {
        progress: RouteProgress,
    },
    WillArrive {
        waypoint: Waypoint,
        eta: Duration,
        distance: f64,
    },
}

/// Questions the route tracker asks before committing to a decision
#[derive(Debug, Clone, Copy)]
pub enum TrackerQuery<'a> {
    ShouldReroute { location: &'a PositionSample },
    ShouldDiscard { location: &'a PositionSample },
    /// Arrived at `waypoint`; answer is whether to advance to the next leg
    DidArrive { waypoint: &'a Waypoint },
    ShouldPreventReroutesWhenArriving { waypoint: &'a Waypoint },
    ShouldDisableBatteryMonitoring,
}

/// Receiver of tracker callbacks, implemented by the session
pub trait TrackerDelegate {
    fn notify(&mut self, event: TrackerEvent);
    fn ask(&mut self, query: TrackerQuery<'_>) -> bool;
}

/// External component that turns position samples into route progress
pub trait RouteTracker: Send {
    /// Feed an accepted sample; callbacks are delivered synchronously
    /// through `delegate` in the order they are raised.
    fn update(&mut self, sample: &PositionSample, delegate: &mut dyn TrackerDelegate);

    /// Current progress snapshot
    fn progress(&self) -> RouteProgress;
}
