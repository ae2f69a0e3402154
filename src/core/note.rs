use crate::core::pitch::Pitch;

/// Opaque identity of a note inside a [`NoteStore`](crate::core::store::NoteStore)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteId(pub(crate) u64);

/// A note as it lives on the grid.
///
/// `start` and `duration` are measured in grid columns (sixteenth notes).
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: NoteId,
    pub pitch: Pitch,
    pub start: u32,
    pub duration: u32,
}

impl Note {
    pub fn row(&self) -> usize {
        self.pitch.row()
    }

    /// Exclusive end column
    pub fn end(&self) -> u32 {
        self.start.saturating_add(self.duration)
    }

    /// Whether a grid cell falls on this note
    pub fn covers(&self, column: u32, row: usize) -> bool {
        row == self.row() && column >= self.start && column < self.end()
    }
}

/// A note that has not been added to a store yet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteSpec {
    pub pitch: Pitch,
    pub start: u32,
    pub duration: u32,
}

impl NoteSpec {
    pub fn new(pitch: Pitch, start: u32, duration: u32) -> Self {
        Self {
            pitch,
            start,
            duration: duration.max(1),
        }
    }
}
