//! Rerouting and lifecycle relay
//!
//! Republishes route tracker events as [`NavigationEvent`]s, answers the
//! tracker's yes/no questions through the application delegate (falling
//! back to [`defaults`]) and owns the audio session around reroute cues.

mod audio;
mod delegate;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::error::{AudioAction, NavError, ReroutingError};
use crate::events::{emit, NavigationEvent};
use crate::location::PositionSample;
use crate::route::{IndexedRoute, RouteProgress, TrackerQuery, VisualInstruction, Waypoint};

pub use audio::AudioSession;
pub use delegate::{default_answer, defaults, NavigationDelegate};

/// Turns tracker notifications into outward events and answers its questions
pub struct LifecycleRelay {
    event_tx: broadcast::Sender<NavigationEvent>,
    delegate: Option<Arc<dyn NavigationDelegate>>,
    audio: Box<dyn AudioSession>,
    play_reroute_cue: bool,
}

impl LifecycleRelay {
    pub fn new(
        event_tx: broadcast::Sender<NavigationEvent>,
        delegate: Option<Arc<dyn NavigationDelegate>>,
        audio: Box<dyn AudioSession>,
        play_reroute_cue: bool,
    ) -> Self {
        Self {
            event_tx,
            delegate,
            audio,
            play_reroute_cue,
        }
    }

    /// Whether a reroute should be announced with the cue.
    ///
    /// The same gate applies to reactive and proactive reroutes.
    pub fn cue_enabled(&self, muted: bool) -> bool {
        self.play_reroute_cue && !muted
    }

    pub fn will_reroute(&mut self, location: &PositionSample, muted: bool) {
        if self.cue_enabled(muted) {
            self.play_cue();
        }
        emit(
            &self.event_tx,
            NavigationEvent::WillReroute {
                location: location.coordinate,
            },
        );
    }

    pub fn did_reroute(
        &mut self,
        route: &IndexedRoute,
        location: Option<&PositionSample>,
        proactive: bool,
        muted: bool,
    ) {
        info!(route_index = route.index, proactive, "rerouted");
        emit(
            &self.event_tx,
            NavigationEvent::did_reroute(route, location, proactive),
        );
        // A faster route replaces the current one without warning otherwise
        if proactive && self.cue_enabled(muted) {
            self.play_cue();
        }
    }

    pub fn did_fail_to_reroute(&self, error: &ReroutingError) {
        warn!(%error, "reroute failed");
        emit(&self.event_tx, NavigationEvent::did_fail_to_reroute(error));
    }

    pub fn did_update_progress(&self, progress: &RouteProgress, location: &PositionSample) {
        emit(
            &self.event_tx,
            NavigationEvent::progress_updated(progress, location),
        );
    }

    pub fn did_pass_visual_instruction_point(
        &self,
        instruction: &VisualInstruction,
        progress: &RouteProgress,
    ) {
        emit(
            &self.event_tx,
            NavigationEvent::passed_visual_instruction(instruction, progress),
        );
    }

    pub fn did_pass_spoken_instruction_point(&self, progress: &RouteProgress) {
        emit(
            &self.event_tx,
            NavigationEvent::passed_spoken_instruction(progress),
        );
    }

    pub fn will_arrive(&self, waypoint: &Waypoint, eta: Duration, distance: f64) {
        emit(
            &self.event_tx,
            NavigationEvent::WillArrive {
                waypoint: waypoint.to_string(),
                eta_secs: eta.as_secs_f64(),
                distance,
            },
        );
    }

    /// Answer a tracker question, asking the delegate first
    pub fn answer(&self, query: TrackerQuery<'_>) -> bool {
        let delegated = self.delegate.as_ref().and_then(|d| d.answer(&query));
        let answer = delegated.unwrap_or_else(|| default_answer(&query));
        debug!(?query, answer, defaulted = delegated.is_none(), "answered tracker query");

        if let TrackerQuery::DidArrive { waypoint } = query {
            info!(%waypoint, advance = answer, "arrived at waypoint");
            emit(&self.event_tx, NavigationEvent::did_arrive(waypoint, answer));
        }
        answer
    }

    /// Mix the audio session and play the reroute cue.
    ///
    /// A mixing failure is reported but the cue still plays.
    fn play_cue(&mut self) {
        if let Err(source) = self.audio.mix_ambient() {
            let cause = format!("{source:#}");
            let err = NavError::AudioControl {
                action: AudioAction::MixAmbient,
                source,
            };
            warn!(error = %err, "audio session control failed");
            emit(
                &self.event_tx,
                NavigationEvent::AudioControlFailed {
                    action: AudioAction::MixAmbient,
                    cause,
                },
            );
        }
        self.audio.play_reroute_cue();
        debug!("reroute cue played");
    }
}
