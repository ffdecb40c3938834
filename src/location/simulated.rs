//! Simulated position source
//!
//! Walks the active route geometry from the current progress, emitting one
//! sample per tick. Speed drops ahead of sharp turns and scales with a
//! live-adjustable multiplier.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::route::{Route, RouteProgress};

use super::geometry::{self, PolylinePoint};
use super::mode::SampleOrigin;
use super::sample::{AccuracyPolicy, PositionSample};
use super::source::{PositionSink, PositionSource};

const SIMULATED_HORIZONTAL_ACCURACY_M: f64 = 5.0;
const SIMULATED_VERTICAL_ACCURACY_M: f64 = 10.0;

/// Speed and cadence of simulated travel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationProfile {
    pub tick: Duration,
    pub max_speed_mps: f64,
    pub min_speed_mps: f64,
}

impl Default for SimulationProfile {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            max_speed_mps: 30.0,
            min_speed_mps: 6.0,
        }
    }
}

impl SimulationProfile {
    /// Cruising speed given the turn angle (degrees) at the next vertex
    fn speed_for_turn(&self, turn: f64) -> f64 {
        let factor = 1.0 - (turn.clamp(0.0, 180.0) / 180.0);
        (self.max_speed_mps * factor).max(self.min_speed_mps)
    }
}

/// Position of a simulated walk along a route; pure so it can be unit tested
#[derive(Debug, Clone)]
struct RouteWalker {
    route: Arc<Route>,
    distance: f64,
    profile: SimulationProfile,
}

impl RouteWalker {
    fn current(&self) -> Option<PolylinePoint> {
        geometry::point_along(&self.route.geometry, self.distance)
    }

    /// Advance one tick and report the resulting sample
    fn step(&mut self, multiplier: f64, policy: &AccuracyPolicy) -> Option<PositionSample> {
        let here = self.current()?;
        let speed = if here.at_end {
            0.0
        } else {
            self.profile.speed_for_turn(here.upcoming_turn)
        };
        self.distance += speed * multiplier * self.profile.tick.as_secs_f64();

        let next = self.current()?;
        let speed = if next.at_end { 0.0 } else { speed * multiplier };
        Some(PositionSample::new(
            next.coordinate,
            next.course,
            speed,
            SIMULATED_HORIZONTAL_ACCURACY_M,
            SIMULATED_VERTICAL_ACCURACY_M,
            policy,
        ))
    }
}

/// Synthetic position source walking the route on a tokio interval
pub struct SimulatedSource {
    epoch: u64,
    walker: Option<RouteWalker>,
    policy: AccuracyPolicy,
    multiplier_tx: watch::Sender<f64>,
    sink: PositionSink,
    task: Option<JoinHandle<()>>,
}

impl SimulatedSource {
    /// Create a source that starts where `progress` left off.
    ///
    /// `epoch` tags every sample so the arbiter can tell episodes apart.
    pub fn new(
        progress: &RouteProgress,
        speed_multiplier: f64,
        epoch: u64,
        profile: SimulationProfile,
        policy: AccuracyPolicy,
        sink: PositionSink,
    ) -> Self {
        let (multiplier_tx, _) = watch::channel(speed_multiplier);
        Self {
            epoch,
            walker: Some(RouteWalker {
                route: Arc::clone(&progress.route.route),
                distance: progress.distance_traveled,
                profile,
            }),
            policy,
            multiplier_tx,
            sink,
            task: None,
        }
    }

    /// Episode tag carried by every sample from this source
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Get the current speed multiplier
    pub fn speed_multiplier(&self) -> f64 {
        *self.multiplier_tx.borrow()
    }

    /// Change the multiplier; a running task picks it up on its next tick
    pub fn set_speed_multiplier(&mut self, multiplier: f64) {
        self.multiplier_tx.send_replace(multiplier);
        debug!(epoch = self.epoch, multiplier, "simulation speed changed");
    }
}

impl PositionSource for SimulatedSource {
    fn start_updating(&mut self) {
        if self.task.is_some() {
            return;
        }
        let Some(mut walker) = self.walker.take() else {
            return;
        };

        let epoch = self.epoch;
        let policy = self.policy;
        let sink = self.sink.clone();
        let multiplier_rx = self.multiplier_tx.subscribe();
        let tick = walker.profile.tick;

        self.task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // First tick completes immediately; skip it so samples start one tick in
            interval.tick().await;

            loop {
                interval.tick().await;
                let multiplier = *multiplier_rx.borrow();
                let Some(sample) = walker.step(multiplier, &policy) else {
                    break;
                };
                if !sink.send(SampleOrigin::Simulated { epoch }, sample).await {
                    break;
                }
            }
            debug!(epoch, "simulated source task finished");
        }));

        info!(epoch, multiplier = self.speed_multiplier(), "simulated source started");
    }

    fn stop_updating(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            info!(epoch = self.epoch, "simulated source stopped");
        }
    }
}

impl Drop for SimulatedSource {
    fn drop(&mut self) {
        self.stop_updating();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::source::PositionUpdate;
    use crate::testing::sample_route;
    use tokio::sync::mpsc;

    fn walker(distance: f64) -> RouteWalker {
        RouteWalker {
            route: Arc::clone(&sample_route().route),
            distance,
            profile: SimulationProfile::default(),
        }
    }

    #[test]
    fn test_speed_slows_for_sharp_turns() {
        let profile = SimulationProfile::default();
        assert_eq!(profile.speed_for_turn(0.0), 30.0);
        assert_eq!(profile.speed_for_turn(90.0), 15.0);
        assert_eq!(profile.speed_for_turn(170.0), 6.0);
    }

    #[test]
    fn test_walker_advances_with_multiplier() {
        let policy = AccuracyPolicy::default();
        let mut slow = walker(0.0);
        let mut fast = walker(0.0);
        slow.step(1.0, &policy).unwrap();
        fast.step(2.0, &policy).unwrap();
        assert!((fast.distance - 2.0 * slow.distance).abs() < 1e-9);
    }

    #[test]
    fn test_walker_samples_are_qualified() {
        let sample = walker(100.0).step(1.0, &AccuracyPolicy::default()).unwrap();
        assert!(sample.qualified);
        assert!(sample.qualified_for_route_start);
        assert!((sample.course - 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_walker_holds_final_position() {
        let mut w = walker(1e9);
        let sample = w.step(1.0, &AccuracyPolicy::default()).unwrap();
        assert_eq!(sample.speed, 0.0);
        let last = *sample_route().route.geometry.last().unwrap();
        assert_eq!(sample.coordinate, last);
    }

    #[tokio::test(start_paused = true)]
    async fn test_source_emits_tagged_samples_until_stopped() {
        let (tx, mut rx) = mpsc::channel::<PositionUpdate>(16);
        let progress = RouteProgress::new(sample_route());
        let mut source = SimulatedSource::new(
            &progress,
            2.0,
            7,
            SimulationProfile::default(),
            AccuracyPolicy::default(),
            PositionSink::new(tx),
        );
        assert_eq!(source.speed_multiplier(), 2.0);

        source.start_updating();
        tokio::time::sleep(Duration::from_millis(3500)).await;

        let mut received = Vec::new();
        while let Ok(update) = rx.try_recv() {
            received.push(update);
        }
        assert_eq!(received.len(), 3);
        assert!(received
            .iter()
            .all(|u| u.origin == SampleOrigin::Simulated { epoch: 7 }));
        assert!((received[0].sample.speed - 60.0).abs() < 1e-9);

        source.stop_updating();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_multiplier_change_reaches_running_task() {
        let (tx, mut rx) = mpsc::channel::<PositionUpdate>(16);
        let progress = RouteProgress::new(sample_route());
        let mut source = SimulatedSource::new(
            &progress,
            1.0,
            1,
            SimulationProfile::default(),
            AccuracyPolicy::default(),
            PositionSink::new(tx),
        );
        source.start_updating();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        source.set_speed_multiplier(3.0);
        tokio::time::sleep(Duration::from_millis(1000)).await;

        let first = rx.try_recv().unwrap().sample.speed;
        let second = rx.try_recv().unwrap().sample.speed;
        assert!((first - 30.0).abs() < 1e-9);
        assert!((second - 90.0).abs() < 1e-9);
    }
}
