//! Audio engine boundary and its cpal-backed implementation

mod bank;
mod engine;
mod voice;

pub use bank::{VoiceBank, MAX_VOICES};
pub use engine::SynthEngine;
pub use voice::{Envelope, Voice, VoiceSettings, VoiceStage, Waveform};

use crate::core::pitch::Pitch;

/// What the sequencer needs from a synthesizer.
///
/// Times are absolute engine seconds as reported by [`SoundEngine::now`].
pub trait SoundEngine {
    fn now(&self) -> f64;
    fn trigger_attack_release(&self, pitch: Pitch, duration: f64, when: f64);
    fn trigger_attack(&self, pitch: Pitch);
    fn trigger_release(&self, pitch: Pitch);
    /// Release every sounding note immediately
    fn release_all(&self);
    /// Drop every trigger that has not started yet
    fn cancel_scheduled(&self);
}
