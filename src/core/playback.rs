use log::{debug, info};

use crate::core::audio::SoundEngine;
use crate::core::grid::COLUMNS_PER_BEAT;
use crate::core::note::Note;

pub const DEFAULT_BPM: f32 = 120.0;
/// Gap between pressing play and the first trigger
pub const START_DELAY: f64 = 0.05;

/// Seconds spanned by one grid column at a tempo
pub fn seconds_per_column(bpm: f32) -> f64 {
    60.0 / bpm.max(1.0) as f64 / COLUMNS_PER_BEAT as f64
}

/// Fire-and-forget score playback.
///
/// Every note is handed to the engine as an absolute-time trigger up front;
/// afterwards this only tracks when the last one ends.
#[derive(Debug)]
pub struct Playback {
    bpm: f32,
    playing: bool,
    started_at: f64,
    ends_at: f64,
}

impl Default for Playback {
    fn default() -> Self {
        Self::new(DEFAULT_BPM)
    }
}

impl Playback {
    pub fn new(bpm: f32) -> Self {
        Self {
            bpm,
            playing: false,
            started_at: 0.0,
            ends_at: 0.0,
        }
    }

    pub fn bpm(&self) -> f32 {
        self.bpm
    }

    /// Takes effect on the next `play`
    pub fn set_bpm(&mut self, bpm: f32) {
        self.bpm = bpm;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Schedule every note. Ignored while already playing; returns whether
    /// playback started.
    pub fn play(&mut self, notes: &[Note], engine: &dyn SoundEngine) -> bool {
        if self.playing {
            debug!("play ignored, already playing");
            return false;
        }
        let Some(last_end) = notes.iter().map(Note::end).max() else {
            return false;
        };

        let spc = seconds_per_column(self.bpm);
        let t0 = engine.now() + START_DELAY;
        for note in notes {
            engine.trigger_attack_release(
                note.pitch,
                note.duration as f64 * spc,
                t0 + note.start as f64 * spc,
            );
        }

        self.playing = true;
        self.started_at = t0;
        self.ends_at = t0 + last_end as f64 * spc;
        info!("playing {} notes for {:.2}s", notes.len(), self.ends_at - t0);
        true
    }

    /// Flip the playing flag off once the last note has finished
    pub fn poll(&mut self, engine: &dyn SoundEngine) -> bool {
        if self.playing && engine.now() >= self.ends_at {
            self.playing = false;
            debug!("playback finished");
        }
        self.playing
    }

    /// Cancel pending triggers and release sounding notes. Safe to call when
    /// nothing is playing.
    pub fn stop(&mut self, engine: &dyn SoundEngine) {
        engine.cancel_scheduled();
        engine.release_all();
        if self.playing {
            info!("playback stopped");
        }
        self.playing = false;
    }

    /// Current playhead in grid columns, while playing
    pub fn position(&self, engine: &dyn SoundEngine) -> Option<f64> {
        if !self.playing {
            return None;
        }
        let elapsed = (engine.now() - self.started_at).max(0.0);
        Some(elapsed / seconds_per_column(self.bpm))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::note::NoteSpec;
    use crate::core::pitch::Pitch;
    use crate::core::store::NoteStore;
    use std::cell::{Cell, RefCell};

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum Call {
        AttackRelease(Pitch, f64, f64),
        Attack(Pitch),
        Release(Pitch),
        ReleaseAll,
        Cancel,
    }

    /// Engine double that records calls and has a hand-driven clock
    #[derive(Default)]
    pub(crate) struct RecordingEngine {
        pub now: Cell<f64>,
        pub calls: RefCell<Vec<Call>>,
    }

    impl SoundEngine for RecordingEngine {
        fn now(&self) -> f64 {
            self.now.get()
        }
        fn trigger_attack_release(&self, pitch: Pitch, duration: f64, when: f64) {
            self.calls.borrow_mut().push(Call::AttackRelease(pitch, duration, when));
        }
        fn trigger_attack(&self, pitch: Pitch) {
            self.calls.borrow_mut().push(Call::Attack(pitch));
        }
        fn trigger_release(&self, pitch: Pitch) {
            self.calls.borrow_mut().push(Call::Release(pitch));
        }
        fn release_all(&self) {
            self.calls.borrow_mut().push(Call::ReleaseAll);
        }
        fn cancel_scheduled(&self) {
            self.calls.borrow_mut().push(Call::Cancel);
        }
    }

    fn store() -> NoteStore {
        let mut store = NoteStore::new();
        store.add(NoteSpec::new(Pitch::C4, 0, 4));
        store.add(NoteSpec::new("E4".parse().unwrap(), 4, 2));
        store.add(NoteSpec::new("G4".parse().unwrap(), 4, 8));
        store
    }

    #[test]
    fn quarter_note_is_four_columns() {
        assert!((seconds_per_column(120.0) * 4.0 - 0.5).abs() < 1e-12);
        assert!((seconds_per_column(60.0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn play_schedules_every_note_at_absolute_times() {
        let engine = RecordingEngine::default();
        engine.now.set(10.0);
        let mut playback = Playback::new(120.0);
        assert!(playback.play(store().notes(), &engine));

        let t0 = 10.0 + START_DELAY;
        let calls = engine.calls.borrow();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0], Call::AttackRelease(Pitch::C4, 0.5, t0));
        assert_eq!(calls[1], Call::AttackRelease("E4".parse().unwrap(), 0.25, t0 + 0.5));
        assert_eq!(calls[2], Call::AttackRelease("G4".parse().unwrap(), 1.0, t0 + 0.5));
    }

    #[test]
    fn play_while_playing_is_ignored() {
        let engine = RecordingEngine::default();
        let mut playback = Playback::default();
        let store = store();
        assert!(playback.play(store.notes(), &engine));
        assert!(!playback.play(store.notes(), &engine));
        assert_eq!(engine.calls.borrow().len(), 3);
    }

    #[test]
    fn playing_flag_clears_after_last_note() {
        let engine = RecordingEngine::default();
        let mut playback = Playback::new(120.0);
        playback.play(store().notes(), &engine);
        // last note ends at column 12 = 1.5s after start
        engine.now.set(START_DELAY + 1.4);
        assert!(playback.poll(&engine));
        assert!(playback.position(&engine).unwrap() > 11.0);
        engine.now.set(START_DELAY + 1.5);
        assert!(!playback.poll(&engine));
        assert!(playback.position(&engine).is_none());
    }

    #[test]
    fn empty_score_does_not_start() {
        let engine = RecordingEngine::default();
        let mut playback = Playback::default();
        assert!(!playback.play(&[], &engine));
        assert!(!playback.is_playing());
    }

    #[test]
    fn stop_while_idle_is_harmless() {
        let engine = RecordingEngine::default();
        let store = store();
        let revision = store.revision();
        let mut playback = Playback::default();
        playback.stop(&engine);
        assert!(!playback.is_playing());
        assert_eq!(store.revision(), revision);
        assert_eq!(store.len(), 3);
        assert_eq!(*engine.calls.borrow(), [Call::Cancel, Call::ReleaseAll]);
    }

    #[test]
    fn stop_cancels_and_releases() {
        let engine = RecordingEngine::default();
        let mut playback = Playback::default();
        playback.play(store().notes(), &engine);
        playback.stop(&engine);
        assert!(!playback.is_playing());
        let calls = engine.calls.borrow();
        assert_eq!(&calls[3..], [Call::Cancel, Call::ReleaseAll]);
        drop(calls);
        // can start again afterwards
        assert!(playback.play(store().notes(), &engine));
    }
}
