use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

use super::VoiceBank;
use crate::core::pitch::Pitch;
use crate::messaging::EngineMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Waveform {
    Sine,
    Square,
    Saw,
    #[default]
    Triangle,
}

impl Waveform {
    pub const ALL: [Waveform; 4] = [Waveform::Sine, Waveform::Square, Waveform::Saw, Waveform::Triangle];

    pub fn sample(&self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (2.0 * PI * phase).sin(),
            Waveform::Square => if phase < 0.5 { 1.0 } else { -1.0 },
            Waveform::Saw => 2.0 * phase - 1.0,
            Waveform::Triangle => {
                if phase < 0.25 {
                    4.0 * phase
                } else if phase < 0.75 {
                    2.0 - 4.0 * phase
                } else {
                    -4.0 + 4.0 * phase
                }
            },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Waveform::Sine => "Sine",
            Waveform::Square => "Square",
            Waveform::Saw => "Saw",
            Waveform::Triangle => "Triangle",
        }
    }
}

/// Linear attack/release envelope, times in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub attack: f32,
    pub release: f32,
}

impl Default for Envelope {
    fn default() -> Self {
        Self {
            attack: 0.005,
            release: 0.08,
        }
    }
}

impl Envelope {
    pub const MAX_ATTACK: f32 = 1.0;
    pub const MAX_RELEASE: f32 = 2.0;

    /// Keep both stages positive and within the toolbar's range
    pub fn clamped(self) -> Self {
        let default = Self::default();
        let fix = |value: f32, fallback: f32, max: f32| {
            if value.is_finite() { value.clamp(0.001, max) } else { fallback }
        };
        Self {
            attack: fix(self.attack, default.attack, Self::MAX_ATTACK),
            release: fix(self.release, default.release, Self::MAX_RELEASE),
        }
    }
}

/// Synth parameters shared by the live engine and offline renders
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceSettings {
    pub waveform: Waveform,
    pub volume: f32,
    pub envelope: Envelope,
}

impl VoiceSettings {
    /// A fresh voice bank configured with these parameters
    pub fn bank(&self, sample_rate: f32) -> VoiceBank {
        let mut bank = VoiceBank::new(sample_rate, self.waveform, self.volume);
        bank.handle(EngineMessage::SetEnvelope(self.envelope));
        bank
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceStage {
    Attack,
    Sustain,
    Release,
    Off,
}

/// One sounding pitch
#[derive(Debug, Clone)]
pub struct Voice {
    pub pitch: Pitch,
    pub phase: f32,
    pub phase_increment: f32,
    pub stage: VoiceStage,
    pub level: f32,
    /// Sample position at which the voice releases on its own
    pub release_at: Option<u64>,
}

impl Voice {
    pub fn new(pitch: Pitch, sample_rate: f32, release_at: Option<u64>) -> Self {
        Self {
            pitch,
            phase: 0.0,
            phase_increment: pitch.frequency() / sample_rate,
            stage: VoiceStage::Attack,
            level: 0.0,
            release_at,
        }
    }

    pub fn is_active(&self) -> bool {
        self.stage != VoiceStage::Off
    }

    pub fn release(&mut self) {
        if matches!(self.stage, VoiceStage::Attack | VoiceStage::Sustain) {
            self.stage = VoiceStage::Release;
        }
    }

    /// Advance one sample and return its value before master volume
    pub fn next_sample(&mut self, waveform: Waveform, envelope: &Envelope, sample_rate: f32) -> f32 {
        let step = 1.0 / sample_rate;
        match self.stage {
            VoiceStage::Attack => {
                self.level += step / envelope.attack.max(step);
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = VoiceStage::Sustain;
                }
            },
            VoiceStage::Sustain => {},
            VoiceStage::Release => {
                self.level -= step / envelope.release.max(step);
                if self.level <= 0.0 {
                    self.level = 0.0;
                    self.stage = VoiceStage::Off;
                }
            },
            VoiceStage::Off => return 0.0,
        }
        let value = waveform.sample(self.phase) * self.level;
        self.phase = (self.phase + self.phase_increment) % 1.0;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voice_attacks_then_releases_to_silence() {
        let envelope = Envelope { attack: 0.01, release: 0.01 };
        let mut voice = Voice::new(Pitch::C4, 1000.0, None);
        for _ in 0..20 {
            voice.next_sample(Waveform::Sine, &envelope, 1000.0);
        }
        assert_eq!(voice.stage, VoiceStage::Sustain);
        voice.release();
        for _ in 0..20 {
            voice.next_sample(Waveform::Sine, &envelope, 1000.0);
        }
        assert!(!voice.is_active());
        assert_eq!(voice.next_sample(Waveform::Sine, &envelope, 1000.0), 0.0);
    }

    #[test]
    fn clamped_envelope_stays_usable() {
        let envelope = Envelope { attack: -1.0, release: f32::NAN }.clamped();
        assert_eq!(envelope.attack, 0.001);
        assert_eq!(envelope.release, Envelope::default().release);
        assert_eq!(Envelope { attack: 9.0, release: 9.0 }.clamped(), Envelope { attack: 1.0, release: 2.0 });
    }

    #[test]
    fn waveforms_stay_in_unit_range() {
        for waveform in Waveform::ALL {
            for i in 0..100 {
                let v = waveform.sample(i as f32 / 100.0);
                assert!((-1.0..=1.0).contains(&v), "{:?} gave {}", waveform, v);
            }
        }
    }
}
