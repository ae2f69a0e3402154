use crate::core::grid::COLUMNS_PER_BEAT;
use crate::core::note::Note;
use crate::core::pitch::Pitch;

/// Beat units in one measure; longer notes are split with ties
pub const UNITS_PER_MEASURE: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteValue {
    Whole,
    Half,
    Quarter,
    Eighth,
}

impl NoteValue {
    pub fn for_units(units: f32) -> Self {
        if units >= 4.0 {
            NoteValue::Whole
        } else if units >= 2.0 {
            NoteValue::Half
        } else if units >= 1.0 {
            NoteValue::Quarter
        } else {
            NoteValue::Eighth
        }
    }

    pub fn has_stem(self) -> bool {
        self != NoteValue::Whole
    }

    pub fn is_filled(self) -> bool {
        matches!(self, NoteValue::Quarter | NoteValue::Eighth)
    }
}

/// One symbol on the staff. A grid note becomes one or more of these.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaffNote {
    pub pitch: Pitch,
    /// Offset from the start of the score, in beat units
    pub start: f32,
    pub units: f32,
    pub value: NoteValue,
    /// Tied to the following piece of the same note
    pub tied: bool,
}

/// Lay notes out for the staff, sorted by start. Notes longer than a measure
/// are split into consecutive tied pieces of at most one measure each.
pub fn staff_notes(notes: &[Note]) -> Vec<StaffNote> {
    let mut sorted: Vec<&Note> = notes.iter().collect();
    sorted.sort_by_key(|n| (n.start, n.pitch));

    let mut out = Vec::new();
    for note in sorted {
        let mut start = note.start as f32 / COLUMNS_PER_BEAT as f32;
        let mut remaining = note.duration as f32 / COLUMNS_PER_BEAT as f32;
        while remaining > UNITS_PER_MEASURE {
            out.push(StaffNote {
                pitch: note.pitch,
                start,
                units: UNITS_PER_MEASURE,
                value: NoteValue::Whole,
                tied: true,
            });
            start += UNITS_PER_MEASURE;
            remaining -= UNITS_PER_MEASURE;
        }
        out.push(StaffNote {
            pitch: note.pitch,
            start,
            units: remaining,
            value: NoteValue::for_units(remaining),
            tied: false,
        });
    }
    out
}

/// Map chromatic semitone (0-11) to diatonic step (0-6), sharps sit on the
/// step below
const SEMITONE_TO_DIATONIC: [i32; 12] = [0, 0, 1, 1, 2, 3, 3, 4, 4, 5, 5, 6];

/// E4, bottom line of the treble staff
pub const TREBLE_BOTTOM: i32 = 4 * 7 + 2;
/// G2, bottom line of the bass staff
pub const BASS_BOTTOM: i32 = 2 * 7 + 4;

/// Diatonic step counted from C0, one step per line or space
pub fn diatonic_step(pitch: Pitch) -> i32 {
    pitch.octave() as i32 * 7 + SEMITONE_TO_DIATONIC[pitch.semitone()]
}

/// Middle C and above go on the treble staff
pub fn is_treble(pitch: Pitch) -> bool {
    pitch >= Pitch::C4
}

/// Steps above the bottom line of the staff the pitch is drawn on
pub fn steps_above_bottom(pitch: Pitch) -> i32 {
    let bottom = if is_treble(pitch) { TREBLE_BOTTOM } else { BASS_BOTTOM };
    diatonic_step(pitch) - bottom
}
