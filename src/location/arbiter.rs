//! Location arbiter: organic vs simulated positioning
//!
//! Decides at every position update whether to trust the organic source,
//! start simulating or stop simulating. Poor-signal fallback is driven by a
//! countdown timer that qualifying organic samples keep resetting; when it
//! expires the arbiter switches to a simulated source seeded from the route
//! tracker's current progress.

use tokio::sync::broadcast;
use tracing::{debug, info, trace, warn};

use crate::events::{emit, NavigationEvent};
use crate::route::{IndexedRoute, RouteProgress, RouteTracker};
use crate::timer::{CountdownTimer, TimerState, TimerTick};

use super::mode::{SampleOrigin, SimulationIntent, SimulationMode};
use super::sample::{AccuracyPolicy, PositionSample};
use super::simulated::{SimulatedSource, SimulationProfile};
use super::source::{PositionSink, PositionSource, PositionUpdate};

const NEUTRAL_SPEED_MULTIPLIER: f64 = 1.0;

/// The source whose samples reach the route tracker
enum ActiveSource {
    Organic,
    Simulated(SimulatedSource),
}

/// Chooses which position source feeds the route tracker
pub struct LocationArbiter {
    mode: SimulationMode,
    started: bool,
    active: ActiveSource,
    organic: Box<dyn PositionSource>,
    timer: CountdownTimer,
    /// Multiplier recorded while in `Always` mode
    speed_multiplier: f64,
    last_epoch: u64,
    profile: SimulationProfile,
    policy: AccuracyPolicy,
    sink: PositionSink,
    event_tx: broadcast::Sender<NavigationEvent>,
}

impl LocationArbiter {
    /// Create a stopped arbiter with the organic source active
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        mode: SimulationMode,
        speed_multiplier: f64,
        organic: Box<dyn PositionSource>,
        timer: CountdownTimer,
        profile: SimulationProfile,
        policy: AccuracyPolicy,
        sink: PositionSink,
        event_tx: broadcast::Sender<NavigationEvent>,
    ) -> Self {
        Self {
            mode,
            started: false,
            active: ActiveSource::Organic,
            organic,
            timer,
            speed_multiplier,
            last_epoch: 0,
            profile,
            policy,
            sink,
            event_tx,
        }
    }

    /// Get the current simulation mode
    pub fn mode(&self) -> SimulationMode {
        self.mode
    }

    /// Whether `start` has been called without a matching `stop`
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Whether the simulated source is the active one
    pub fn is_simulating(&self) -> bool {
        matches!(self.active, ActiveSource::Simulated(_))
    }

    /// Get the poor-signal timer state
    pub fn timer_state(&self) -> TimerState {
        self.timer.state()
    }

    /// Effective multiplier; neutral outside `Always` mode
    pub fn simulation_speed_multiplier(&self) -> f64 {
        if self.mode == SimulationMode::Always {
            self.speed_multiplier
        } else {
            NEUTRAL_SPEED_MULTIPLIER
        }
    }

    /// Begin delivering updates; in `Always` mode also start simulating
    pub fn start(&mut self, tracker: &dyn RouteTracker) {
        if self.started {
            return;
        }
        self.started = true;
        self.organic.start_updating();
        info!(mode = %self.mode, "location arbiter started");

        if self.mode == SimulationMode::Always {
            self.begin_simulation(SimulationIntent::Manual, tracker);
        }
    }

    /// Stop both sources and disarm the timer. Idempotent.
    pub fn stop(&mut self, tracker: &dyn RouteTracker) {
        if !self.started {
            return;
        }
        self.timer.disarm();
        self.organic.stop_updating();
        self.end_simulation(SimulationIntent::Manual, tracker);
        self.started = false;
        info!("location arbiter stopped");
    }

    /// Switch simulation policy, starting or ending simulation as needed
    pub fn set_simulation_mode(&mut self, mode: SimulationMode, tracker: &dyn RouteTracker) {
        let previous = self.mode;
        self.mode = mode;
        info!(from = %previous, to = %mode, "simulation mode changed");

        match mode {
            SimulationMode::Always => {
                self.timer.disarm();
                if self.started {
                    self.begin_simulation(SimulationIntent::Manual, tracker);
                }
            }
            SimulationMode::OnPoorSignal => {
                if self.started && !self.is_simulating() {
                    self.timer.arm();
                }
            }
            SimulationMode::Never => {
                self.end_simulation(SimulationIntent::Manual, tracker);
                self.timer.disarm();
            }
        }

        let multiplier = self.simulation_speed_multiplier();
        if let ActiveSource::Simulated(source) = &mut self.active {
            source.set_speed_multiplier(multiplier);
        }
    }

    /// Record a new multiplier; ignored outside `Always` mode
    pub fn set_simulation_speed_multiplier(&mut self, multiplier: f64) {
        if self.mode != SimulationMode::Always {
            debug!(multiplier, mode = %self.mode, "ignoring speed multiplier outside always mode");
            return;
        }
        if !(multiplier.is_finite() && multiplier > 0.0) {
            warn!(multiplier, "ignoring non-positive speed multiplier");
            return;
        }

        self.speed_multiplier = multiplier;
        if let ActiveSource::Simulated(source) = &mut self.active {
            source.set_speed_multiplier(multiplier);
        }
    }

    /// Ingest a sample from either source.
    ///
    /// Returns the sample when it should be forwarded to the route tracker,
    /// which is exactly when it came from the active source.
    pub fn on_position_update(
        &mut self,
        update: PositionUpdate,
        tracker: &dyn RouteTracker,
    ) -> Option<PositionSample> {
        let PositionUpdate { origin, sample } = update;

        if !self.started {
            trace!(?origin, "dropping sample while stopped");
            return None;
        }

        match origin {
            SampleOrigin::Organic => self.on_organic_sample(sample, tracker),
            SampleOrigin::Simulated { epoch } => match &self.active {
                ActiveSource::Simulated(source) if source.epoch() == epoch => Some(sample),
                _ => {
                    trace!(epoch, "dropping sample from released simulated source");
                    None
                }
            },
        }
    }

    fn on_organic_sample(
        &mut self,
        sample: PositionSample,
        tracker: &dyn RouteTracker,
    ) -> Option<PositionSample> {
        if self.mode == SimulationMode::Always {
            trace!("ignoring organic sample while always simulating");
            return None;
        }

        if self.mode == SimulationMode::OnPoorSignal && sample.qualified {
            if self.timer.is_disarmed() {
                if sample.qualified_for_route_start {
                    self.timer.arm();
                }
            } else {
                // Good signal: restart the patience interval
                self.timer.reset();
            }

            if self.is_simulating() {
                info!(
                    accuracy_m = sample.horizontal_accuracy,
                    "qualified organic sample received, ending poor signal simulation"
                );
                self.end_simulation(SimulationIntent::PoorSignal, tracker);
                self.timer.reset();
            }
        }

        if self.is_simulating() {
            None
        } else {
            Some(sample)
        }
    }

    /// Handle a tick from the countdown timer
    pub fn on_timer_tick(&mut self, tick: TimerTick, tracker: &dyn RouteTracker) {
        if !self.timer.acknowledge(tick) {
            return;
        }

        if self.mode == SimulationMode::OnPoorSignal && self.started {
            warn!(
                patience_ms = self.timer.interval().as_millis() as u64,
                "no qualified organic sample within patience interval"
            );
            self.begin_simulation(SimulationIntent::PoorSignal, tracker);
        } else {
            debug!(mode = %self.mode, "timer fired outside poor signal mode, ignoring");
        }

        self.timer.settle();
    }

    fn begin_simulation(&mut self, intent: SimulationIntent, tracker: &dyn RouteTracker) {
        if self.is_simulating() {
            return;
        }
        let progress = tracker.progress();
        let distance_traveled = progress.distance_traveled;

        emit(
            &self.event_tx,
            NavigationEvent::WillBeginSimulating {
                intent,
                distance_traveled,
            },
        );

        self.active = ActiveSource::Simulated(self.spawn_source(&progress));
        info!(?intent, epoch = self.last_epoch, "simulation started");

        emit(
            &self.event_tx,
            NavigationEvent::DidBeginSimulating {
                intent,
                distance_traveled,
            },
        );
    }

    /// Re-seed a running simulation onto the route the tracker switched to.
    ///
    /// The replacement runs under a new epoch, so samples already queued
    /// from the old route are dropped.
    pub fn reroute(&mut self, route: &IndexedRoute, tracker: &dyn RouteTracker) {
        if !self.is_simulating() {
            return;
        }
        let mut progress = tracker.progress();
        if progress.route != *route {
            progress = RouteProgress::new(route.clone());
        }

        let source = self.spawn_source(&progress);
        // Replacing the old source drops it, which stops its task
        self.active = ActiveSource::Simulated(source);
        info!(
            epoch = self.last_epoch,
            route_index = route.index,
            distance_traveled = progress.distance_traveled,
            "simulation moved to new route"
        );
    }

    /// Start a simulated source from `progress` under the next epoch
    fn spawn_source(&mut self, progress: &RouteProgress) -> SimulatedSource {
        self.last_epoch += 1;
        let mut source = SimulatedSource::new(
            progress,
            self.simulation_speed_multiplier(),
            self.last_epoch,
            self.profile,
            self.policy,
            self.sink.clone(),
        );
        source.start_updating();
        source
    }

    fn end_simulation(&mut self, intent: SimulationIntent, tracker: &dyn RouteTracker) {
        if !self.is_simulating() {
            return;
        }
        let distance_traveled = tracker.progress().distance_traveled;

        emit(
            &self.event_tx,
            NavigationEvent::WillEndSimulating {
                intent,
                distance_traveled,
            },
        );

        if let ActiveSource::Simulated(mut source) =
            std::mem::replace(&mut self.active, ActiveSource::Organic)
        {
            source.stop_updating();
        }
        info!(?intent, "simulation ended");

        emit(
            &self.event_tx,
            NavigationEvent::DidEndSimulating {
                intent,
                distance_traveled,
            },
        );
    }
}
