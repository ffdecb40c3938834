//! Recording collaborators shared by unit tests

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::location::{Coordinate, PositionSample};
use crate::relay::{AudioSession, NavigationDelegate};
use crate::route::{
    IndexedRoute, LegProgress, Route, RouteLeg, RouteOptions, RouteProgress, RouteStep,
    RouteTracker, SpokenInstruction, TrackerDelegate, TrackerQuery, VisualInstruction, Waypoint,
};
use crate::voice::SpeechSynthesizer;

/// Two-step route heading east then north; the first two segments are collinear
pub(crate) fn sample_route() -> IndexedRoute {
    let geometry = vec![
        Coordinate::new(0.0, 0.0),
        Coordinate::new(0.0, 0.01),
        Coordinate::new(0.0, 0.02),
        Coordinate::new(0.01, 0.02),
    ];
    let route = Route {
        distance: crate::location::geometry::length(&geometry),
        geometry,
        legs: vec![RouteLeg {
            name: "Main Street, Elm Street".into(),
            steps: vec![
                RouteStep {
                    name: "Main Street".into(),
                    distance: 2224.0,
                    spoken_instructions: vec![
                        SpokenInstruction {
                            distance_along_step: 2224.0,
                            text: "Head east on Main Street".into(),
                            ssml_text: None,
                        },
                        SpokenInstruction {
                            distance_along_step: 200.0,
                            text: "Turn left onto Elm Street".into(),
                            ssml_text: Some("<speak>Turn left onto Elm Street</speak>".into()),
                        },
                    ],
                    visual_instructions: vec![VisualInstruction {
                        distance_along_step: 2224.0,
                        primary_text: "Elm Street".into(),
                        secondary_text: None,
                    }],
                },
                RouteStep {
                    name: "Elm Street".into(),
                    distance: 1112.0,
                    spoken_instructions: vec![SpokenInstruction {
                        distance_along_step: 100.0,
                        text: "You have arrived".into(),
                        ssml_text: None,
                    }],
                    visual_instructions: Vec::new(),
                },
            ],
            destination: Waypoint {
                name: Some("Office".into()),
                coordinate: Coordinate::new(0.01, 0.02),
            },
        }],
        expected_travel_time: 300.0,
        speech_locale: Some("en-US".into()),
        options: RouteOptions {
            locale: Some("en-GB".into()),
        },
    };
    IndexedRoute::new(route, 0)
}

/// Single-step route one degree north of [`sample_route`], heading east
pub(crate) fn detour_route() -> IndexedRoute {
    let geometry = vec![Coordinate::new(1.0, 0.0), Coordinate::new(1.0, 0.02)];
    let route = Route {
        distance: crate::location::geometry::length(&geometry),
        geometry,
        legs: vec![RouteLeg {
            name: "North Road".into(),
            steps: vec![RouteStep {
                name: "North Road".into(),
                distance: 2224.0,
                spoken_instructions: vec![SpokenInstruction {
                    distance_along_step: 2224.0,
                    text: "Head east on North Road".into(),
                    ssml_text: None,
                }],
                visual_instructions: Vec::new(),
            }],
            destination: Waypoint {
                name: None,
                coordinate: Coordinate::new(1.0, 0.02),
            },
        }],
        expected_travel_time: 150.0,
        speech_locale: None,
        options: RouteOptions::default(),
    };
    IndexedRoute::new(route, 1)
}

type Reaction = Box<dyn FnOnce(&PositionSample, &mut dyn TrackerDelegate) + Send>;

/// Shared view of what a [`FakeTracker`] saw
#[derive(Default)]
pub(crate) struct TrackerLog {
    pub samples: Vec<PositionSample>,
    pub answers: Vec<bool>,
}

/// Route tracker that records samples and runs queued reactions on update
#[derive(Clone)]
pub(crate) struct FakeTracker {
    progress: RouteProgress,
    log: Arc<Mutex<TrackerLog>>,
    reactions: Arc<Mutex<VecDeque<Reaction>>>,
}

impl FakeTracker {
    pub fn new() -> Self {
        Self {
            progress: RouteProgress::new(sample_route()),
            log: Arc::default(),
            reactions: Arc::default(),
        }
    }

    pub fn log(&self) -> Arc<Mutex<TrackerLog>> {
        Arc::clone(&self.log)
    }

    /// Run `reaction` on the next update
    pub fn on_next_update(
        &self,
        reaction: impl FnOnce(&PositionSample, &mut dyn TrackerDelegate) + Send + 'static,
    ) {
        self.reactions.lock().unwrap().push_back(Box::new(reaction));
    }

    pub fn sample_count(&self) -> usize {
        self.log.lock().unwrap().samples.len()
    }
}

impl RouteTracker for FakeTracker {
    fn update(&mut self, sample: &PositionSample, delegate: &mut dyn TrackerDelegate) {
        self.log.lock().unwrap().samples.push(sample.clone());
        let reaction = self.reactions.lock().unwrap().pop_front();
        if let Some(reaction) = reaction {
            reaction(sample, delegate);
        }
    }

    fn progress(&self) -> RouteProgress {
        self.progress.clone()
    }
}

/// Record an answer from inside a tracker reaction
pub(crate) fn ask_and_log(
    log: &Arc<Mutex<TrackerLog>>,
    delegate: &mut dyn TrackerDelegate,
    query: TrackerQuery<'_>,
) -> bool {
    let answer = delegate.ask(query);
    log.lock().unwrap().answers.push(answer);
    answer
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SpeechCall {
    Prepare {
        count: usize,
        locale: Option<String>,
    },
    Speak {
        text: String,
        locale: Option<String>,
        step_index: usize,
    },
    Stop,
    Muted(bool),
    Volume(f32),
    Locale(Option<String>),
}

#[derive(Clone, Default)]
pub(crate) struct RecordingSynthesizer {
    calls: Arc<Mutex<Vec<SpeechCall>>>,
}

impl RecordingSynthesizer {
    pub fn calls(&self) -> Vec<SpeechCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn spoken_texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SpeechCall::Speak { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn stop_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, SpeechCall::Stop))
            .count()
    }

    fn record(&self, call: SpeechCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl SpeechSynthesizer for RecordingSynthesizer {
    fn prepare_upcoming(&mut self, instructions: &[SpokenInstruction], locale: Option<&str>) {
        self.record(SpeechCall::Prepare {
            count: instructions.len(),
            locale: locale.map(str::to_owned),
        });
    }

    fn speak(
        &mut self,
        instruction: &SpokenInstruction,
        leg_progress: &LegProgress<'_>,
        locale: Option<&str>,
    ) {
        self.record(SpeechCall::Speak {
            text: instruction.text.clone(),
            locale: locale.map(str::to_owned),
            step_index: leg_progress.step_index,
        });
    }

    fn stop_speaking(&mut self) {
        self.record(SpeechCall::Stop);
    }

    fn set_muted(&mut self, muted: bool) {
        self.record(SpeechCall::Muted(muted));
    }

    fn set_volume(&mut self, volume: f32) {
        self.record(SpeechCall::Volume(volume));
    }

    fn set_locale(&mut self, locale: Option<&str>) {
        self.record(SpeechCall::Locale(locale.map(str::to_owned)));
    }
}

#[derive(Debug, Default)]
pub(crate) struct AudioLog {
    pub mix_attempts: usize,
    pub cues: usize,
}

#[derive(Clone, Default)]
pub(crate) struct RecordingAudio {
    log: Arc<Mutex<AudioLog>>,
    failure: Option<String>,
}

impl RecordingAudio {
    pub fn failing(reason: &str) -> Self {
        Self {
            log: Arc::default(),
            failure: Some(reason.to_owned()),
        }
    }

    pub fn log(&self) -> Arc<Mutex<AudioLog>> {
        Arc::clone(&self.log)
    }
}

impl AudioSession for RecordingAudio {
    fn mix_ambient(&mut self) -> anyhow::Result<()> {
        self.log.lock().unwrap().mix_attempts += 1;
        match &self.failure {
            Some(reason) => Err(anyhow::anyhow!("{reason}")),
            None => Ok(()),
        }
    }

    fn play_reroute_cue(&mut self) {
        self.log.lock().unwrap().cues += 1;
    }
}

/// Delegate with fixed answers; `None` declines
#[derive(Debug, Default)]
pub(crate) struct ScriptedDelegate {
    pub should_reroute: Option<bool>,
    pub should_discard: Option<bool>,
    pub did_arrive: Option<bool>,
    pub prevent_reroutes_on_arrival: Option<bool>,
    pub disable_battery_monitoring: Option<bool>,
}

impl NavigationDelegate for ScriptedDelegate {
    fn answer(&self, query: &TrackerQuery<'_>) -> Option<bool> {
        match query {
            TrackerQuery::ShouldReroute { .. } => self.should_reroute,
            TrackerQuery::ShouldDiscard { .. } => self.should_discard,
            TrackerQuery::DidArrive { .. } => self.did_arrive,
            TrackerQuery::ShouldPreventReroutesWhenArriving { .. } => {
                self.prevent_reroutes_on_arrival
            }
            TrackerQuery::ShouldDisableBatteryMonitoring => self.disable_battery_monitoring,
        }
    }
}
