//! Session event loop
//!
//! Owns the location arbiter, the lifecycle relay and the instruction
//! dispatcher, and drains every input on a single task so state transitions
//! never interleave.

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::Result;
use crate::events::{emit, NavigationEvent};
use crate::location::{LocationArbiter, PositionSink, PositionUpdate, SampleOrigin};
use crate::relay::LifecycleRelay;
use crate::route::{IndexedRoute, RouteTracker, TrackerDelegate, TrackerEvent, TrackerQuery};
use crate::timer::{CountdownTimer, TimerTick};
use crate::voice::{InstructionDispatcher, SettingsChange};

use super::{Collaborators, SessionHandle, SessionInput, SessionStatus};

/// Single-task owner of the arbiter, relay and dispatcher
pub struct NavigationSession {
    tracker: Box<dyn RouteTracker>,
    arbiter: LocationArbiter,
    relay: LifecycleRelay,
    dispatcher: InstructionDispatcher,
    input_rx: mpsc::Receiver<SessionInput>,
    simulated_rx: mpsc::Receiver<PositionUpdate>,
    tick_rx: mpsc::UnboundedReceiver<TimerTick>,
    settings_rx: Option<broadcast::Receiver<SettingsChange>>,
    event_tx: broadcast::Sender<NavigationEvent>,
}

impl NavigationSession {
    /// Build a session and its handle.
    ///
    /// Fails on invalid configuration or undeclared capabilities; a session
    /// is never constructed in a state it cannot run in.
    pub fn new(config: SessionConfig, collaborators: Collaborators) -> Result<(Self, SessionHandle)> {
        config.validate()?;
        config.check_capabilities()?;

        let Collaborators {
            tracker,
            organic,
            synthesizer,
            audio,
            delegate,
            settings,
            voice,
        } = collaborators;

        let (input_tx, input_rx) = mpsc::channel(config.input_capacity);
        let (simulated_tx, simulated_rx) = mpsc::channel(config.input_capacity);
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        let (event_tx, _) = broadcast::channel(config.event_capacity);

        let arbiter = LocationArbiter::new(
            config.simulation_mode,
            config.simulation_speed_multiplier,
            organic,
            CountdownTimer::new(config.poor_signal_patience, tick_tx),
            config.simulation,
            config.accuracy,
            PositionSink::new(simulated_tx),
            event_tx.clone(),
        );
        let relay = LifecycleRelay::new(event_tx.clone(), delegate, audio, config.play_reroute_cue);
        let dispatcher = InstructionDispatcher::new(synthesizer, voice);

        let session = Self {
            tracker,
            arbiter,
            relay,
            dispatcher,
            input_rx,
            simulated_rx,
            tick_rx,
            settings_rx: settings,
            event_tx: event_tx.clone(),
        };
        Ok((session, SessionHandle::new(input_tx, event_tx)))
    }

    /// Drain inputs until shutdown or until every handle is dropped
    pub async fn run(mut self) {
        info!(mode = %self.arbiter.mode(), "navigation session ready");

        loop {
            tokio::select! {
                biased;

                input = self.input_rx.recv() => {
                    match input {
                        Some(input) => {
                            if !self.handle_input(input) {
                                break;
                            }
                        }
                        None => {
                            debug!("all session handles dropped");
                            break;
                        }
                    }
                }

                Some(tick) = self.tick_rx.recv() => {
                    self.arbiter.on_timer_tick(tick, &*self.tracker);
                }

                Some(update) = self.simulated_rx.recv() => {
                    self.handle_position(update);
                }

                change = next_settings(&mut self.settings_rx) => {
                    self.handle_settings(change);
                }
            }
        }

        self.stop();
        info!("navigation session ended");
    }

    /// Returns false when the loop should exit
    fn handle_input(&mut self, input: SessionInput) -> bool {
        match input {
            SessionInput::Start => self.start(),
            SessionInput::Stop => self.stop(),
            SessionInput::SetSimulationMode(mode) => {
                self.arbiter.set_simulation_mode(mode, &*self.tracker);
            }
            SessionInput::SetSpeedMultiplier(multiplier) => {
                self.arbiter.set_simulation_speed_multiplier(multiplier);
            }
            SessionInput::OrganicPosition(sample) => {
                self.handle_position(PositionUpdate {
                    origin: SampleOrigin::Organic,
                    sample,
                });
            }
            SessionInput::Tracker(event) => {
                if let Some(route) = relay_tracker_event(&mut self.relay, &mut self.dispatcher, event) {
                    self.arbiter.reroute(&route, &*self.tracker);
                }
            }
            SessionInput::Status(reply) => {
                let _ = reply.send(self.status());
            }
            SessionInput::Shutdown => {
                info!("shutdown requested");
                return false;
            }
        }
        true
    }

    fn start(&mut self) {
        if self.arbiter.is_started() {
            return;
        }
        emit(&self.event_tx, NavigationEvent::SessionStarted);
        self.arbiter.start(&*self.tracker);
    }

    fn stop(&mut self) {
        if !self.arbiter.is_started() {
            return;
        }
        self.arbiter.stop(&*self.tracker);
        emit(&self.event_tx, NavigationEvent::SessionStopped);
    }

    fn handle_position(&mut self, update: PositionUpdate) {
        let Some(sample) = self.arbiter.on_position_update(update, &*self.tracker) else {
            return;
        };

        let mut bridge = TrackerBridge {
            relay: &mut self.relay,
            dispatcher: &mut self.dispatcher,
            rerouted: None,
            stop_requested: false,
        };
        self.tracker.update(&sample, &mut bridge);
        let TrackerBridge {
            rerouted,
            stop_requested,
            ..
        } = bridge;

        if let Some(route) = rerouted {
            self.arbiter.reroute(&route, &*self.tracker);
        }
        if stop_requested {
            info!("arrived without advancing, stopping session");
            self.stop();
        }
    }

    fn handle_settings(&mut self, change: std::result::Result<SettingsChange, broadcast::error::RecvError>) {
        match change {
            Ok(change) => self.dispatcher.apply_settings(change),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(skipped = n, "settings receiver lagged");
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("settings channel closed");
                self.settings_rx = None;
            }
        }
    }

    fn status(&self) -> SessionStatus {
        SessionStatus {
            started: self.arbiter.is_started(),
            mode: self.arbiter.mode(),
            simulating: self.arbiter.is_simulating(),
            speed_multiplier: self.arbiter.simulation_speed_multiplier(),
            timer: self.arbiter.timer_state(),
            voice: self.dispatcher.settings(),
            last_instruction: self.dispatcher.last_dispatched().map(str::to_owned),
        }
    }
}

async fn next_settings(
    rx: &mut Option<broadcast::Receiver<SettingsChange>>,
) -> std::result::Result<SettingsChange, broadcast::error::RecvError> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Fan a tracker notification out to the relay and the dispatcher, in order.
///
/// Returns the new route after a reroute so the caller can move a running
/// simulation onto it.
fn relay_tracker_event(
    relay: &mut LifecycleRelay,
    dispatcher: &mut InstructionDispatcher,
    event: TrackerEvent,
) -> Option<IndexedRoute> {
    match event {
        TrackerEvent::ProgressUpdated { progress, location } => {
            relay.did_update_progress(&progress, &location);
        }
        TrackerEvent::WillReroute { location } => {
            dispatcher.stop_speaking();
            relay.will_reroute(&location, dispatcher.is_muted());
        }
        TrackerEvent::DidReroute {
            route,
            location,
            proactive,
        } => {
            let muted = dispatcher.is_muted();
            if proactive && relay.cue_enabled(muted) {
                dispatcher.stop_speaking();
            }
            relay.did_reroute(&route, location.as_ref(), proactive, muted);
            return Some(route);
        }
        TrackerEvent::DidFailToReroute { error } => relay.did_fail_to_reroute(&error),
        TrackerEvent::PassedVisualInstructionPoint {
            instruction,
            progress,
        } => relay.did_pass_visual_instruction_point(&instruction, &progress),
        TrackerEvent::PassedSpokenInstructionPoint { progress } => {
            let outcome = dispatcher.on_spoken_instruction_point(&progress);
            debug!(?outcome, "spoken instruction point");
            relay.did_pass_spoken_instruction_point(&progress);
        }
        TrackerEvent::WillArrive {
            waypoint,
            eta,
            distance,
        } => relay.will_arrive(&waypoint, eta, distance),
    }
    None
}

/// Delegate handed to the tracker for the duration of one update
struct TrackerBridge<'a> {
    relay: &'a mut LifecycleRelay,
    dispatcher: &'a mut InstructionDispatcher,
    /// Latest route the tracker switched to during this update
    rerouted: Option<IndexedRoute>,
    stop_requested: bool,
}

impl TrackerDelegate for TrackerBridge<'_> {
    fn notify(&mut self, event: TrackerEvent) {
        if let Some(route) = relay_tracker_event(&mut *self.relay, &mut *self.dispatcher, event) {
            self.rerouted = Some(route);
        }
    }

    fn ask(&mut self, query: TrackerQuery<'_>) -> bool {
        let answer = self.relay.answer(query);
        if matches!(query, TrackerQuery::DidArrive { .. }) && !answer {
            self.stop_requested = true;
        }
        answer
    }
}
