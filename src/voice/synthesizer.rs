//! Text-to-speech collaborator

use crate::route::{LegProgress, SpokenInstruction};

/// Speech backend rendering spoken instructions.
///
/// Calls must not block; synthesis and playback complete on the backend's
/// own schedule.
pub trait SpeechSynthesizer: Send {
    /// Hint that these instructions are coming up, for pre-buffering
    fn prepare_upcoming(&mut self, instructions: &[SpokenInstruction], locale: Option<&str>);

    /// Queue an instruction. `leg_progress` lets the backend resolve
    /// pronunciation of the step and road names the instruction mentions.
    fn speak(
        &mut self,
        instruction: &SpokenInstruction,
        leg_progress: &LegProgress<'_>,
        locale: Option<&str>,
    );

    fn stop_speaking(&mut self);

    fn set_muted(&mut self, muted: bool);

    fn set_volume(&mut self, volume: f32);

    fn set_locale(&mut self, locale: Option<&str>);
}
