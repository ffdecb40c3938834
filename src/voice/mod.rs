//! Spoken instructions
//!
//! The dispatcher reacts to spoken instruction points raised by the route
//! tracker, suppresses back-to-back repeats and forwards the rest to the
//! speech synthesizer unless audio is muted.

mod dispatcher;
mod settings;
mod synthesizer;

pub use dispatcher::{DispatchOutcome, InstructionDispatcher};
pub use settings::{SettingsChange, VoiceSettings};
pub use synthesizer::SpeechSynthesizer;
