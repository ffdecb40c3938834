//! Spoken instruction dispatch with deduplication

use tracing::{debug, info};

use crate::route::RouteProgress;

use super::settings::{SettingsChange, VoiceSettings};
use super::synthesizer::SpeechSynthesizer;

/// What happened to the instruction at a spoken instruction point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Submitted to the synthesizer
    Spoken,
    /// Recorded as dispatched but not spoken because audio is muted
    Muted,
    /// Same text as the previously dispatched instruction
    Duplicate,
    /// The step has no instruction left to speak
    NoInstruction,
}

/// Forwards spoken instructions to the synthesizer, skipping repeats
pub struct InstructionDispatcher {
    synthesizer: Box<dyn SpeechSynthesizer>,
    settings: VoiceSettings,
    /// Text of the most recently dispatched instruction
    last_dispatched: Option<String>,
    locale: Option<String>,
}

impl InstructionDispatcher {
    pub fn new(mut synthesizer: Box<dyn SpeechSynthesizer>, settings: VoiceSettings) -> Self {
        synthesizer.set_muted(settings.muted);
        synthesizer.set_volume(settings.volume);
        Self {
            synthesizer,
            settings,
            last_dispatched: None,
            locale: None,
        }
    }

    pub fn settings(&self) -> VoiceSettings {
        self.settings
    }

    pub fn is_muted(&self) -> bool {
        self.settings.muted
    }

    pub fn last_dispatched(&self) -> Option<&str> {
        self.last_dispatched.as_deref()
    }

    /// Handle a passed spoken instruction point
    pub fn on_spoken_instruction_point(&mut self, progress: &RouteProgress) -> DispatchOutcome {
        let locale = progress.speech_locale().map(str::to_owned);
        if locale != self.locale {
            debug!(?locale, "speech locale changed");
            self.synthesizer.set_locale(locale.as_deref());
            self.locale = locale;
        }

        let remaining = progress.remaining_spoken_instructions();
        if !remaining.is_empty() {
            self.synthesizer
                .prepare_upcoming(remaining, self.locale.as_deref());
        }

        let (Some(instruction), Some(leg_progress)) = (
            progress.current_spoken_instruction(),
            progress.current_leg_progress(),
        ) else {
            return DispatchOutcome::NoInstruction;
        };

        if self.last_dispatched.as_deref() == Some(instruction.text.as_str()) {
            debug!(text = %instruction.text, "suppressing repeated instruction");
            return DispatchOutcome::Duplicate;
        }
        self.last_dispatched = Some(instruction.text.clone());

        if self.settings.muted {
            debug!(text = %instruction.text, "muted, not speaking instruction");
            return DispatchOutcome::Muted;
        }

        info!(
            text = %instruction.text,
            leg = leg_progress.leg_index,
            step = leg_progress.step_index,
            "speaking instruction"
        );
        self.synthesizer
            .speak(instruction, &leg_progress, self.locale.as_deref());
        DispatchOutcome::Spoken
    }

    /// Apply a settings change immediately; queued audio is left alone
    pub fn apply_settings(&mut self, change: SettingsChange) {
        let before = self.settings;
        if !self.settings.apply(change) {
            return;
        }
        if self.settings.muted != before.muted {
            self.synthesizer.set_muted(self.settings.muted);
        }
        if self.settings.volume != before.volume {
            self.synthesizer.set_volume(self.settings.volume);
        }
        info!(
            muted = self.settings.muted,
            volume = self.settings.volume,
            "voice settings updated"
        );
    }

    /// Interrupt the utterance in progress
    pub fn stop_speaking(&mut self) {
        self.synthesizer.stop_speaking();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::{IndexedRoute, Route, RouteLeg, RouteStep, SpokenInstruction};
    use crate::testing::{sample_route, RecordingSynthesizer, SpeechCall};

    /// Progress pointing at a step whose only instruction says `text`
    fn progress_saying(text: &str) -> RouteProgress {
        let mut route: Route = (*sample_route().route).clone();
        route.legs[0].steps[0] = RouteStep {
            name: "Main Street".into(),
            distance: 1000.0,
            spoken_instructions: vec![SpokenInstruction {
                distance_along_step: 100.0,
                text: text.into(),
                ssml_text: None,
            }],
            visual_instructions: Vec::new(),
        };
        RouteProgress::new(IndexedRoute::new(route, 0))
    }

    fn create_dispatcher() -> (InstructionDispatcher, RecordingSynthesizer) {
        let synth = RecordingSynthesizer::default();
        let dispatcher = InstructionDispatcher::new(Box::new(synth.clone()), VoiceSettings::default());
        synth.clear();
        (dispatcher, synth)
    }

    #[test]
    fn test_dedup_against_immediately_previous_text() {
        let (mut dispatcher, synth) = create_dispatcher();
        let outcomes: Vec<_> = ["A", "A", "B", "A"]
            .iter()
            .map(|t| dispatcher.on_spoken_instruction_point(&progress_saying(t)))
            .collect();

        assert_eq!(
            outcomes,
            vec![
                DispatchOutcome::Spoken,
                DispatchOutcome::Duplicate,
                DispatchOutcome::Spoken,
                DispatchOutcome::Spoken,
            ]
        );
        assert_eq!(synth.spoken_texts(), vec!["A", "B", "A"]);
    }

    #[test]
    fn test_muting_updates_dedup_state_without_speaking() {
        let (mut dispatcher, synth) = create_dispatcher();
        dispatcher.apply_settings(SettingsChange {
            muted: Some(true),
            volume: None,
        });
        assert_eq!(
            dispatcher.on_spoken_instruction_point(&progress_saying("A")),
            DispatchOutcome::Muted
        );
        assert_eq!(dispatcher.last_dispatched(), Some("A"));

        dispatcher.apply_settings(SettingsChange {
            muted: Some(false),
            volume: None,
        });
        // "A" was already dispatched while muted
        assert_eq!(
            dispatcher.on_spoken_instruction_point(&progress_saying("A")),
            DispatchOutcome::Duplicate
        );
        assert_eq!(
            dispatcher.on_spoken_instruction_point(&progress_saying("B")),
            DispatchOutcome::Spoken
        );
        assert_eq!(synth.spoken_texts(), vec!["B"]);
    }

    #[test]
    fn test_prepares_remaining_and_resolves_locale() {
        let (mut dispatcher, synth) = create_dispatcher();
        dispatcher.on_spoken_instruction_point(&RouteProgress::new(sample_route()));

        assert_eq!(
            synth.calls(),
            vec![
                SpeechCall::Locale(Some("en-GB".into())),
                SpeechCall::Prepare {
                    count: 2,
                    locale: Some("en-GB".into())
                },
                SpeechCall::Speak {
                    text: "Head east on Main Street".into(),
                    locale: Some("en-GB".into()),
                    step_index: 0,
                },
            ]
        );
    }

    #[test]
    fn test_no_instruction_left() {
        let (mut dispatcher, synth) = create_dispatcher();
        let mut progress = RouteProgress::new(sample_route());
        progress.spoken_instruction_index = 5;
        assert_eq!(
            dispatcher.on_spoken_instruction_point(&progress),
            DispatchOutcome::NoInstruction
        );
        assert!(synth.spoken_texts().is_empty());
    }

    #[test]
    fn test_settings_forwarded_to_synthesizer() {
        let (mut dispatcher, synth) = create_dispatcher();
        dispatcher.apply_settings(SettingsChange {
            muted: Some(true),
            volume: Some(0.4),
        });
        dispatcher.apply_settings(SettingsChange {
            muted: Some(true),
            volume: None,
        });
        assert_eq!(
            synth.calls(),
            vec![SpeechCall::Muted(true), SpeechCall::Volume(0.4)]
        );
        assert!(dispatcher.is_muted());
    }

    #[test]
    fn test_stop_speaking() {
        let (mut dispatcher, synth) = create_dispatcher();
        dispatcher.stop_speaking();
        assert_eq!(synth.calls(), vec![SpeechCall::Stop]);
    }

    #[test]
    fn test_leg_without_steps_yields_no_instruction() {
        let (mut dispatcher, _synth) = create_dispatcher();
        let mut route: Route = (*sample_route().route).clone();
        route.legs = vec![RouteLeg {
            steps: Vec::new(),
            ..route.legs[0].clone()
        }];
        let progress = RouteProgress::new(IndexedRoute::new(route, 0));
        assert_eq!(
            dispatcher.on_spoken_instruction_point(&progress),
            DispatchOutcome::NoInstruction
        );
    }
}
