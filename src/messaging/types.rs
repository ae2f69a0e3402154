use crate::core::audio::{Envelope, Waveform};
use crate::core::pitch::Pitch;

/// Message types sent from the UI thread to the audio engine
#[derive(Debug, Clone)]
pub enum EngineMessage {
    NoteOn(Pitch),
    NoteOff(Pitch),
    /// Play `pitch` for `duration` seconds starting at engine time `when`
    ScheduleNote { pitch: Pitch, duration: f64, when: f64 },
    CancelScheduled,
    ReleaseAll,
    SetVolume(f32),
    SetWaveform(Waveform),
    SetEnvelope(Envelope),
}
