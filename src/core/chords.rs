//! Canned "Pythagorean" interval demo.
//!
//! Builds a base note and one note per just-intonation interval above it,
//! each snapped to the nearest equal-tempered pitch.

use crate::core::note::NoteSpec;
use crate::core::pitch::Pitch;

/// C4 in Hz
pub const BASE_FREQUENCY: f32 = 261.63;

pub const INTERVAL_NOTE_LENGTH: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub name: &'static str,
    pub ratio: f32,
}

pub const INTERVALS: [Interval; 4] = [
    Interval { name: "fourth", ratio: 4.0 / 3.0 },
    Interval { name: "fifth", ratio: 3.0 / 2.0 },
    Interval { name: "major third", ratio: 5.0 / 4.0 },
    Interval { name: "minor third", ratio: 6.0 / 5.0 },
];

pub fn interval_frequency(base: f32, ratio: f32) -> f32 {
    base * ratio
}

/// The base note at column 0, then every interval note on its own four
/// columns, back to back.
pub fn pythagorean_notes() -> Vec<NoteSpec> {
    let base = Pitch::from_frequency(BASE_FREQUENCY).unwrap_or(Pitch::C4);
    let mut notes = vec![NoteSpec::new(base, 0, INTERVAL_NOTE_LENGTH)];
    for (i, interval) in INTERVALS.iter().enumerate() {
        let freq = interval_frequency(BASE_FREQUENCY, interval.ratio);
        if let Some(pitch) = Pitch::from_frequency(freq) {
            let start = (i as u32 + 1) * INTERVAL_NOTE_LENGTH;
            notes.push(NoteSpec::new(pitch, start, INTERVAL_NOTE_LENGTH));
        }
    }
    notes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifth_above_c4() {
        let freq = interval_frequency(BASE_FREQUENCY, 3.0 / 2.0);
        assert!((freq - 392.445).abs() < 1e-3, "got {}", freq);
    }

    #[test]
    fn generates_base_and_four_intervals() {
        let notes = pythagorean_notes();
        let names: Vec<String> = notes.iter().map(|n| n.pitch.name()).collect();
        assert_eq!(names, ["C4", "F4", "G4", "E4", "D#4"]);
        for (i, note) in notes.iter().enumerate() {
            assert_eq!(note.start, i as u32 * INTERVAL_NOTE_LENGTH);
            assert_eq!(note.duration, INTERVAL_NOTE_LENGTH);
        }
    }

    #[test]
    fn layout_never_overlaps() {
        let notes = pythagorean_notes();
        for pair in notes.windows(2) {
            assert!(pair[0].start + pair[0].duration <= pair[1].start);
        }
    }
}
