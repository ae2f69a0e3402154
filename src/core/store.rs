use log::debug;
use rand::Rng;

use crate::core::grid::{Cell, GROW_COLUMNS, INITIAL_COLUMNS, MAX_COLUMNS};
use crate::core::note::{Note, NoteId, NoteSpec};
use crate::core::pitch::{Pitch, PITCH_COUNT};

/// Result of a click-to-place gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Selected(NoteId),
    Created(NoteId),
}

impl Placement {
    pub fn id(self) -> NoteId {
        match self {
            Placement::Selected(id) | Placement::Created(id) => id,
        }
    }
}

/// The editable score: every note, the single optional selection and the
/// current grid width.
#[derive(Debug)]
pub struct NoteStore {
    notes: Vec<Note>,
    selected: Option<NoteId>,
    columns: u32,
    next_id: u64,
    revision: u64,
}

impl Default for NoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NoteStore {
    pub fn new() -> Self {
        Self::with_columns(INITIAL_COLUMNS)
    }

    pub fn with_columns(columns: u32) -> Self {
        Self {
            notes: Vec::new(),
            selected: None,
            columns: columns.max(1),
            next_id: 1,
            revision: 0,
        }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    /// Bumped on every mutation, used to invalidate cached drawings
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn selected(&self) -> Option<NoteId> {
        self.selected
    }

    pub fn selected_note(&self) -> Option<&Note> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    fn get_mut(&mut self, id: NoteId) -> Option<&mut Note> {
        self.notes.iter_mut().find(|n| n.id == id)
    }

    /// Exclusive end column of the furthest note
    pub fn furthest_end(&self) -> Option<u32> {
        self.notes.iter().map(Note::end).max()
    }

    /// The most recently added note covering a cell
    pub fn note_at(&self, cell: Cell) -> Option<NoteId> {
        self.notes
            .iter()
            .rev()
            .find(|n| n.covers(cell.column, cell.row))
            .map(|n| n.id)
    }

    pub fn select(&mut self, id: NoteId) {
        if self.get(id).is_some() && self.selected != Some(id) {
            self.selected = Some(id);
            self.touch();
        }
    }

    /// Click-to-place: select the note under the cell, or create a one-column
    /// note there and select it instead.
    pub fn place(&mut self, cell: Cell) -> Option<Placement> {
        if let Some(id) = self.note_at(cell) {
            self.select(id);
            return Some(Placement::Selected(id));
        }
        let pitch = Pitch::from_row(cell.row)?;
        let id = self.add(NoteSpec::new(pitch, cell.column, 1));
        self.selected = Some(id);
        Some(Placement::Created(id))
    }

    /// Add a single note, growing the grid once if it lands on the last column
    pub fn add(&mut self, spec: NoteSpec) -> NoteId {
        let id = self.push(spec);
        self.grow_for(spec.start);
        self.touch();
        id
    }

    /// Add a note with a random pitch, column and length inside the grid
    pub fn add_random<R: Rng + ?Sized>(&mut self, rng: &mut R) -> NoteId {
        let row = rng.random_range(0..PITCH_COUNT);
        let pitch = Pitch::from_row(row).unwrap_or(Pitch::C4);
        let start = rng.random_range(0..self.columns);
        let duration = rng.random_range(1..=4);
        self.add(NoteSpec::new(pitch, start, duration))
    }

    /// Append a batch of notes, growing the grid until all of them fit
    pub fn append(&mut self, specs: impl IntoIterator<Item = NoteSpec>) -> usize {
        let mut added = 0;
        for spec in specs {
            self.push(spec);
            added += 1;
        }
        self.fit_columns();
        self.touch();
        added
    }

    /// Replace the whole score. The grid is never narrowed.
    pub fn replace_all(&mut self, specs: impl IntoIterator<Item = NoteSpec>) -> usize {
        self.notes.clear();
        self.selected = None;
        self.append(specs)
    }

    pub fn clear(&mut self) {
        debug!("clearing {} notes", self.notes.len());
        self.notes.clear();
        self.selected = None;
        self.touch();
    }

    /// Move a note to a new start column and row; the pitch follows the row.
    pub fn move_note(&mut self, id: NoteId, column: u32, row: usize) -> bool {
        let Some(pitch) = Pitch::from_row(row) else {
            return false;
        };
        let Some(note) = self.get_mut(id) else {
            return false;
        };
        let column = column.min(MAX_COLUMNS - note.duration);
        if note.start == column && note.pitch == pitch {
            return false;
        }
        note.start = column;
        note.pitch = pitch;
        self.grow_for(column);
        self.touch();
        true
    }

    pub fn resize_note(&mut self, id: NoteId, duration: u32) -> bool {
        let Some(note) = self.get_mut(id) else {
            return false;
        };
        let duration = duration.clamp(1, MAX_COLUMNS - note.start);
        if note.duration == duration {
            return false;
        }
        note.duration = duration;
        let last = note.end() - 1;
        self.grow_for(last);
        self.touch();
        true
    }

    fn push(&mut self, spec: NoteSpec) -> NoteId {
        let id = NoteId(self.next_id);
        self.next_id += 1;
        let start = spec.start.min(MAX_COLUMNS - 1);
        self.notes.push(Note {
            id,
            pitch: spec.pitch,
            start,
            duration: spec.duration.clamp(1, MAX_COLUMNS - start),
        });
        id
    }

    /// Widen the grid in fixed steps until `column` is no longer the last one
    fn grow_for(&mut self, column: u32) {
        let column = column.min(MAX_COLUMNS - 1);
        if column + 1 < self.columns {
            return;
        }
        while column + 1 >= self.columns {
            self.columns += GROW_COLUMNS;
        }
        debug!("grid grown to {} columns", self.columns);
    }

    fn fit_columns(&mut self) {
        let Some(end) = self.furthest_end() else {
            return;
        };
        while end >= self.columns {
            self.columns += GROW_COLUMNS;
        }
        debug!("grid fits {} columns", self.columns);
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn cell(column: u32, row: usize) -> Cell {
        Cell { column, row }
    }

    #[test]
    fn placing_creates_selected_one_column_note() {
        let mut store = NoteStore::new();
        let placed = store.place(cell(3, 10)).unwrap();
        let Placement::Created(id) = placed else {
            panic!("expected a new note, got {:?}", placed);
        };
        let note = store.get(id).unwrap();
        assert_eq!(note.start, 3);
        assert_eq!(note.duration, 1);
        assert_eq!(note.row(), 10);
        assert_eq!(store.selected(), Some(id));
    }

    #[test]
    fn clicking_inside_a_note_selects_it() {
        let mut store = NoteStore::new();
        let long = store.add(NoteSpec::new(Pitch::from_row(5).unwrap(), 2, 4));
        let other = store.place(cell(20, 5)).unwrap().id();
        assert_eq!(store.selected(), Some(other));

        for column in 2..6 {
            assert_eq!(store.place(cell(column, 5)), Some(Placement::Selected(long)));
            assert_eq!(store.selected(), Some(long));
        }
        assert_eq!(store.len(), 2);

        // one past the end is a fresh cell
        assert!(matches!(store.place(cell(6, 5)), Some(Placement::Created(_))));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn only_one_note_is_ever_selected() {
        let mut store = NoteStore::new();
        let first = store.place(cell(0, 0)).unwrap().id();
        let second = store.place(cell(4, 0)).unwrap().id();
        assert_ne!(first, second);
        assert_eq!(store.selected(), Some(second));
        store.select(first);
        assert_eq!(store.selected(), Some(first));
    }

    #[test]
    fn placing_on_last_column_grows_by_fifty() {
        let mut store = NoteStore::new();
        let width = store.columns();
        store.place(cell(width - 2, 0));
        assert_eq!(store.columns(), width);
        store.place(cell(width - 1, 0));
        assert_eq!(store.columns(), width + GROW_COLUMNS);
        let width = store.columns();
        store.place(cell(width, 1));
        assert_eq!(store.columns(), width + GROW_COLUMNS);
    }

    #[test]
    fn resize_is_floored_at_one() {
        let mut store = NoteStore::new();
        let id = store.add(NoteSpec::new(Pitch::C4, 10, 3));
        assert!(store.resize_note(id, 0));
        assert_eq!(store.get(id).unwrap().duration, 1);
    }

    #[test]
    fn moving_keeps_pitch_in_step_with_row() {
        let mut store = NoteStore::new();
        let id = store.add(NoteSpec::new(Pitch::C4, 0, 1));
        for row in 0..PITCH_COUNT {
            store.move_note(id, 1, row);
            let note = store.get(id).unwrap();
            assert_eq!(note.row(), row);
            assert_eq!(note.pitch, Pitch::from_row(row).unwrap());
        }
        assert!(!store.move_note(id, 1, PITCH_COUNT));
    }

    #[test]
    fn replace_all_keeps_width_when_nothing_fits() {
        let mut store = NoteStore::new();
        store.place(cell(1, 1));
        let width = store.columns();
        assert_eq!(store.replace_all(Vec::new()), 0);
        assert!(store.is_empty());
        assert_eq!(store.selected(), None);
        assert_eq!(store.columns(), width);
    }

    #[test]
    fn replace_all_grows_to_fit_furthest_note() {
        let mut store = NoteStore::new();
        store.replace_all(vec![NoteSpec::new(Pitch::C4, 200, 8)]);
        assert!(store.columns() > 208);
        assert_eq!((store.columns() - INITIAL_COLUMNS) % GROW_COLUMNS, 0);
    }

    #[test]
    fn far_moves_grow_until_the_note_fits() {
        let mut store = NoteStore::new();
        let id = store.add(NoteSpec::new(Pitch::C4, 0, 2));
        assert!(store.move_note(id, 130, Pitch::C4.row()));
        assert_eq!(store.columns(), INITIAL_COLUMNS + 2 * GROW_COLUMNS);
        assert!(store.get(id).unwrap().start < store.columns());

        assert!(store.resize_note(id, 100));
        assert!(store.get(id).unwrap().end() <= store.columns());
        assert_eq!((store.columns() - INITIAL_COLUMNS) % GROW_COLUMNS, 0);
    }

    #[test]
    fn notes_never_pass_the_column_limit() {
        let mut store = NoteStore::new();
        store.replace_all(vec![NoteSpec::new(Pitch::C4, u32::MAX, u32::MAX)]);
        let note = store.notes()[0].clone();
        assert_eq!(note.start, MAX_COLUMNS - 1);
        assert_eq!(note.end(), MAX_COLUMNS);
        assert!(store.columns() > MAX_COLUMNS);
        assert!(store.columns() <= MAX_COLUMNS + GROW_COLUMNS);

        assert!(!store.resize_note(note.id, u32::MAX));
        store.move_note(note.id, u32::MAX, 0);
        assert_eq!(store.get(note.id).unwrap().end(), MAX_COLUMNS);
    }

    #[test]
    fn clear_removes_notes_and_selection() {
        let mut store = NoteStore::new();
        store.place(cell(1, 1));
        store.place(cell(2, 2));
        let width = store.columns();
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.selected(), None);
        assert_eq!(store.columns(), width);
    }

    #[test]
    fn random_notes_stay_in_range_and_unselected() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut store = NoteStore::new();
        for _ in 0..100 {
            let before = store.columns();
            let id = store.add_random(&mut rng);
            let note = store.get(id).unwrap();
            assert!(note.start < before);
            assert!((1..=4).contains(&note.duration));
            assert!(note.row() < PITCH_COUNT);
        }
        assert_eq!(store.selected(), None);
        assert_eq!(store.len(), 100);
    }

    #[test]
    fn revision_tracks_mutations() {
        let mut store = NoteStore::new();
        let start = store.revision();
        let id = store.add(NoteSpec::new(Pitch::C4, 0, 1));
        assert!(store.revision() > start);
        let before = store.revision();
        assert!(!store.move_note(id, 0, Pitch::C4.row()));
        assert_eq!(store.revision(), before);
    }
}
