//! Stand-in collaborators for replaying a scenario without a platform

use tracing::info;

use crate::location::geometry;
use crate::location::PositionSample;
use crate::relay::AudioSession;
use crate::route::{
    IndexedRoute, LegProgress, RouteProgress, RouteTracker, SpokenInstruction, TrackerDelegate,
    TrackerEvent, TrackerQuery,
};
use crate::voice::SpeechSynthesizer;

/// Samples closer than this to the destination count as arrival
const ARRIVAL_RADIUS_M: f64 = 25.0;

/// Speech backend that logs what it would say
#[derive(Debug, Default)]
pub struct LoggingSynthesizer;

impl SpeechSynthesizer for LoggingSynthesizer {
    fn prepare_upcoming(&mut self, instructions: &[SpokenInstruction], locale: Option<&str>) {
        info!(count = instructions.len(), ?locale, "prepare upcoming instructions");
    }

    fn speak(
        &mut self,
        instruction: &SpokenInstruction,
        leg_progress: &LegProgress<'_>,
        locale: Option<&str>,
    ) {
        let step = leg_progress.current_step().map(|s| s.name.as_str());
        info!(text = %instruction.text, ?step, ?locale, "speak");
    }

    fn stop_speaking(&mut self) {
        info!("stop speaking");
    }

    fn set_muted(&mut self, muted: bool) {
        info!(muted, "synthesizer muted");
    }

    fn set_volume(&mut self, volume: f32) {
        info!(volume, "synthesizer volume");
    }

    fn set_locale(&mut self, locale: Option<&str>) {
        info!(?locale, "synthesizer locale");
    }
}

/// Audio session that logs instead of touching hardware
#[derive(Debug, Default)]
pub struct LoggingAudio;

impl AudioSession for LoggingAudio {
    fn mix_ambient(&mut self) -> anyhow::Result<()> {
        info!("audio mixed ambient");
        Ok(())
    }

    fn play_reroute_cue(&mut self) {
        info!("reroute cue");
    }
}

/// Tracker that reports progress at a fixed point on the route and asks
/// the arrival question once a sample lands near the final destination
pub struct ReplayTracker {
    progress: RouteProgress,
    samples: usize,
    arrived: bool,
}

impl ReplayTracker {
    pub fn new(route: IndexedRoute) -> Self {
        Self {
            progress: RouteProgress::new(route),
            samples: 0,
            arrived: false,
        }
    }

    pub fn samples(&self) -> usize {
        self.samples
    }
}

impl RouteTracker for ReplayTracker {
    fn update(&mut self, sample: &PositionSample, delegate: &mut dyn TrackerDelegate) {
        self.samples += 1;

        if delegate.ask(TrackerQuery::ShouldDiscard { location: sample }) {
            return;
        }

        delegate.notify(TrackerEvent::ProgressUpdated {
            progress: self.progress.clone(),
            location: sample.clone(),
        });

        if self.arrived {
            return;
        }
        let route = self.progress.route.route.clone();
        let Some(destination) = route.legs.last().map(|leg| &leg.destination) else {
            return;
        };
        if geometry::distance(sample.coordinate, destination.coordinate) <= ARRIVAL_RADIUS_M {
            self.arrived = true;
            delegate.ask(TrackerQuery::DidArrive {
                waypoint: destination,
            });
        }
    }

    fn progress(&self) -> RouteProgress {
        self.progress.clone()
    }
}
