use std::cmp::Reverse;
use std::collections::BinaryHeap;

use super::voice::{Envelope, Voice, VoiceStage, Waveform};
use crate::core::pitch::Pitch;
use crate::messaging::EngineMessage;

/// Hard cap on simultaneously sounding voices; the oldest are dropped first
pub const MAX_VOICES: usize = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct ScheduledNote {
    at: u64,
    length: u64,
    pitch: Pitch,
}

/// Polyphonic voice pool with a sample clock and a queue of timed notes.
///
/// Owned by whichever thread renders audio: the cpal callback for live
/// playback or the caller for offline rendering.
pub struct VoiceBank {
    sample_rate: f32,
    waveform: Waveform,
    envelope: Envelope,
    volume: f32,
    voices: Vec<Voice>,
    scheduled: BinaryHeap<Reverse<ScheduledNote>>,
    clock: u64,
}

impl VoiceBank {
    pub fn new(sample_rate: f32, waveform: Waveform, volume: f32) -> Self {
        Self {
            sample_rate,
            waveform,
            envelope: Envelope::default(),
            volume: volume.clamp(0.0, 1.0),
            voices: Vec::with_capacity(MAX_VOICES),
            scheduled: BinaryHeap::new(),
            clock: 0,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Samples rendered so far
    pub fn clock(&self) -> u64 {
        self.clock
    }

    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    pub fn scheduled_len(&self) -> usize {
        self.scheduled.len()
    }

    fn to_samples(&self, seconds: f64) -> u64 {
        (seconds.max(0.0) * self.sample_rate as f64).round() as u64
    }

    pub fn handle(&mut self, msg: EngineMessage) {
        match msg {
            EngineMessage::NoteOn(pitch) => {
                let held = self
                    .voices
                    .iter()
                    .any(|v| v.pitch == pitch && v.release_at.is_none() && v.stage != VoiceStage::Release);
                if !held {
                    self.start_voice(pitch, None);
                }
            },
            EngineMessage::NoteOff(pitch) => {
                for voice in self.voices.iter_mut().filter(|v| v.pitch == pitch && v.release_at.is_none()) {
                    voice.release();
                }
            },
            EngineMessage::ScheduleNote { pitch, duration, when } => {
                let at = self.to_samples(when);
                let length = self.to_samples(duration).max(1);
                self.scheduled.push(Reverse(ScheduledNote { at, length, pitch }));
            },
            EngineMessage::CancelScheduled => self.scheduled.clear(),
            EngineMessage::ReleaseAll => {
                for voice in &mut self.voices {
                    voice.release();
                }
            },
            EngineMessage::SetVolume(volume) => self.volume = volume.clamp(0.0, 1.0),
            EngineMessage::SetWaveform(waveform) => self.waveform = waveform,
            EngineMessage::SetEnvelope(envelope) => self.envelope = envelope.clamped(),
        }
    }

    fn start_voice(&mut self, pitch: Pitch, release_at: Option<u64>) {
        if self.voices.len() >= MAX_VOICES {
            self.voices.remove(0);
        }
        self.voices.push(Voice::new(pitch, self.sample_rate, release_at));
    }

    /// Render one mono sample and advance the clock
    pub fn next_sample(&mut self) -> f32 {
        while let Some(Reverse(next)) = self.scheduled.peek().copied() {
            if next.at > self.clock {
                break;
            }
            self.scheduled.pop();
            self.start_voice(next.pitch, Some(self.clock + next.length));
        }

        let clock = self.clock;
        let waveform = self.waveform;
        let envelope = self.envelope;
        let sample_rate = self.sample_rate;
        let mut mix = 0.0;
        for voice in &mut self.voices {
            if voice.release_at.is_some_and(|at| at <= clock) {
                voice.release();
            }
            mix += voice.next_sample(waveform, &envelope, sample_rate);
        }
        self.voices.retain(Voice::is_active);
        self.clock += 1;

        // keep a handful of voices from clipping hard
        (mix * self.volume * 0.25).clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank() -> VoiceBank {
        VoiceBank::new(1000.0, Waveform::Square, 1.0)
    }

    fn run(bank: &mut VoiceBank, samples: usize) -> Vec<f32> {
        (0..samples).map(|_| bank.next_sample()).collect()
    }

    #[test]
    fn scheduled_note_sounds_in_its_window() {
        let mut bank = bank();
        bank.handle(EngineMessage::ScheduleNote { pitch: Pitch::C4, duration: 0.05, when: 0.1 });
        let before = run(&mut bank, 100);
        assert!(before.iter().all(|s| *s == 0.0));
        assert_eq!(bank.active_voices(), 0);
        run(&mut bank, 10);
        assert_eq!(bank.active_voices(), 1);
        run(&mut bank, 200);
        assert_eq!(bank.active_voices(), 0);
        assert_eq!(bank.scheduled_len(), 0);
    }

    #[test]
    fn overlapping_notes_play_together() {
        let mut bank = bank();
        for pitch in ["C4", "E4", "G4"] {
            bank.handle(EngineMessage::ScheduleNote { pitch: pitch.parse().unwrap(), duration: 0.5, when: 0.0 });
        }
        run(&mut bank, 10);
        assert_eq!(bank.active_voices(), 3);
    }

    #[test]
    fn cancel_drops_pending_notes_only() {
        let mut bank = bank();
        bank.handle(EngineMessage::NoteOn(Pitch::C4));
        bank.handle(EngineMessage::ScheduleNote { pitch: Pitch::C4, duration: 0.1, when: 1.0 });
        bank.handle(EngineMessage::CancelScheduled);
        assert_eq!(bank.scheduled_len(), 0);
        run(&mut bank, 5);
        assert_eq!(bank.active_voices(), 1);
    }

    #[test]
    fn release_all_silences_held_notes() {
        let mut bank = bank();
        bank.handle(EngineMessage::NoteOn(Pitch::C4));
        bank.handle(EngineMessage::NoteOn("A4".parse().unwrap()));
        run(&mut bank, 20);
        bank.handle(EngineMessage::ReleaseAll);
        run(&mut bank, 200);
        assert_eq!(bank.active_voices(), 0);
    }

    #[test]
    fn note_off_only_releases_held_voice() {
        let mut bank = bank();
        bank.handle(EngineMessage::NoteOn(Pitch::C4));
        bank.handle(EngineMessage::NoteOn(Pitch::C4));
        run(&mut bank, 5);
        assert_eq!(bank.active_voices(), 1);
        bank.handle(EngineMessage::NoteOff(Pitch::C4));
        run(&mut bank, 200);
        assert_eq!(bank.active_voices(), 0);
    }

    #[test]
    fn voice_count_is_capped() {
        let mut bank = bank();
        for i in 0..(MAX_VOICES + 10) {
            let pitch = Pitch::from_row(i).unwrap();
            bank.handle(EngineMessage::NoteOn(pitch));
        }
        run(&mut bank, 1);
        assert_eq!(bank.active_voices(), MAX_VOICES);
    }

    #[test]
    fn envelope_sets_release_length() {
        let mut bank = bank();
        bank.handle(EngineMessage::SetEnvelope(Envelope { attack: 0.001, release: 0.5 }));
        bank.handle(EngineMessage::NoteOn(Pitch::C4));
        run(&mut bank, 10);
        bank.handle(EngineMessage::NoteOff(Pitch::C4));
        run(&mut bank, 400);
        assert_eq!(bank.active_voices(), 1);
        run(&mut bank, 200);
        assert_eq!(bank.active_voices(), 0);
    }
}
