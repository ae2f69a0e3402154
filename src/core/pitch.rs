use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};

use crate::utils::helpers::{freq_to_midi_note, midi_note_to_freq};

pub const NOTE_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

pub const LOWEST_OCTAVE: u8 = 1;
pub const HIGHEST_OCTAVE: u8 = 7;

/// Number of rows in the grid: every chromatic pitch from C1 to B7
pub const PITCH_COUNT: usize = (HIGHEST_OCTAVE - LOWEST_OCTAVE + 1) as usize * 12;

const LOWEST_MIDI: u8 = (LOWEST_OCTAVE + 1) * 12;
const HIGHEST_MIDI: u8 = LOWEST_MIDI + PITCH_COUNT as u8 - 1;

/// A chromatic pitch inside the supported 7-octave range.
///
/// Stored as a MIDI note number; the grid row is always derived from it,
/// with row 0 at the top of the grid (B7) and the last row at C1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pitch(u8);

impl Pitch {
    pub const C4: Pitch = Pitch(60);

    /// Build a pitch from a MIDI note number, if it is in range
    pub fn from_midi(note: u8) -> Option<Self> {
        (LOWEST_MIDI..=HIGHEST_MIDI).contains(&note).then_some(Pitch(note))
    }

    pub fn from_row(row: usize) -> Option<Self> {
        if row >= PITCH_COUNT {
            return None;
        }
        Some(Pitch(HIGHEST_MIDI - row as u8))
    }

    /// Nearest equal-tempered pitch for a frequency, if it lands in range
    pub fn from_frequency(freq: f32) -> Option<Self> {
        if !freq.is_finite() || freq <= 0.0 {
            return None;
        }
        Self::from_midi(freq_to_midi_note(freq))
    }

    /// Iterate the supported range from the top row down
    pub fn all() -> impl Iterator<Item = Pitch> {
        (0..PITCH_COUNT).filter_map(Pitch::from_row)
    }

    pub fn row(self) -> usize {
        (HIGHEST_MIDI - self.0) as usize
    }

    pub fn octave(self) -> u8 {
        self.0 / 12 - 1
    }

    /// Position inside the octave, 0 = C
    pub fn semitone(self) -> usize {
        (self.0 % 12) as usize
    }

    pub fn letter(self) -> &'static str {
        NOTE_NAMES[self.semitone()]
    }

    pub fn is_sharp(self) -> bool {
        matches!(self.semitone(), 1 | 3 | 6 | 8 | 10)
    }

    pub fn frequency(self) -> f32 {
        midi_note_to_freq(self.0)
    }

    pub fn name(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.letter(), self.octave())
    }
}

impl FromStr for Pitch {
    type Err = anyhow::Error;

    /// Parses names such as `C4` or `F#2`. Only sharps are accepted,
    /// matching the names the grid itself produces.
    fn from_str(s: &str) -> Result<Self> {
        let split = s
            .find(|c: char| c.is_ascii_digit() || c == '-')
            .ok_or_else(|| anyhow!("missing octave in pitch name '{}'", s))?;
        let (letter, octave) = s.split_at(split);
        let semitone = NOTE_NAMES
            .iter()
            .position(|name| *name == letter)
            .ok_or_else(|| anyhow!("unknown note name '{}'", letter))?;
        let octave: i32 = octave
            .parse()
            .map_err(|_| anyhow!("invalid octave in pitch name '{}'", s))?;
        let midi = 12 * (octave + 1) + semitone as i32;
        u8::try_from(midi)
            .ok()
            .and_then(Pitch::from_midi)
            .ok_or_else(|| anyhow!("pitch '{}' is outside the supported range", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_covers_seven_octaves() {
        assert_eq!(PITCH_COUNT, 84);
        assert_eq!(Pitch::from_row(0).map(|p| p.name()), Some("B7".to_string()));
        assert_eq!(Pitch::from_row(PITCH_COUNT - 1).map(|p| p.name()), Some("C1".to_string()));
        assert!(Pitch::from_row(PITCH_COUNT).is_none());
    }

    #[test]
    fn row_round_trips_for_every_pitch() {
        for row in 0..PITCH_COUNT {
            let pitch = Pitch::from_row(row).unwrap();
            assert_eq!(pitch.row(), row);
            assert_eq!(pitch.name().parse::<Pitch>().unwrap(), pitch);
        }
    }

    #[test]
    fn names_use_sharps() {
        assert_eq!(Pitch::C4.name(), "C4");
        assert_eq!(Pitch::from_midi(61).unwrap().name(), "C#4");
        assert!(Pitch::from_midi(61).unwrap().is_sharp());
        assert!("Db4".parse::<Pitch>().is_err());
        assert!("C9".parse::<Pitch>().is_err());
        assert!("C0".parse::<Pitch>().is_err());
    }

    #[test]
    fn frequency_lookup_picks_nearest_pitch() {
        assert_eq!(Pitch::from_frequency(440.0).unwrap().name(), "A4");
        assert_eq!(Pitch::from_frequency(392.445).unwrap().name(), "G4");
        assert_eq!(Pitch::from_frequency(327.04).unwrap().name(), "E4");
        assert!(Pitch::from_frequency(0.0).is_none());
        assert!(Pitch::from_frequency(20_000.0).is_none());
    }
}
