use egui::Pos2;
use log::debug;

use crate::core::grid::GridGeometry;
use crate::core::note::NoteId;
use crate::core::pitch::{Pitch, PITCH_COUNT};
use crate::core::store::{NoteStore, Placement};

/// What the pointer is currently doing to the selected note
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Idle,
    Dragging { id: NoteId, grab_offset: i64 },
    Resizing { id: NoteId },
}

/// What a pointer-down at a position would start, used for cursor hints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverTarget {
    Empty,
    Body,
    ResizeHandle,
}

/// Turns pointer events on the grid into store edits.
///
/// All positions are relative to the grid's top-left corner.
#[derive(Debug)]
pub struct InputController {
    geometry: GridGeometry,
    gesture: Gesture,
}

impl Default for InputController {
    fn default() -> Self {
        Self::new(GridGeometry::default())
    }
}

impl InputController {
    pub fn new(geometry: GridGeometry) -> Self {
        Self {
            geometry,
            gesture: Gesture::Idle,
        }
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    /// Primary click: select the note under the pointer or create one.
    /// Returns the pitch of the affected note so it can be previewed.
    pub fn click(&mut self, store: &mut NoteStore, pos: Pos2) -> Option<Pitch> {
        let cell = self.geometry.cell_at(pos)?;
        let placement = store.place(cell)?;
        if let Placement::Created(id) = placement {
            debug!("created note {:?} at column {} row {}", id, cell.column, cell.row);
        }
        store.get(placement.id()).map(|n| n.pitch)
    }

    pub fn hover_target(&self, store: &NoteStore, pos: Pos2) -> HoverTarget {
        match store.selected_note() {
            Some(note) if self.geometry.in_resize_handle(note, pos) => HoverTarget::ResizeHandle,
            Some(note) if self.geometry.in_body(note, pos) => HoverTarget::Body,
            _ => HoverTarget::Empty,
        }
    }

    /// Start a drag or resize when pressing on the selected note
    pub fn pointer_down(&mut self, store: &NoteStore, pos: Pos2) -> bool {
        let Some(note) = store.selected_note() else {
            return false;
        };
        self.gesture = match self.hover_target(store, pos) {
            HoverTarget::ResizeHandle => Gesture::Resizing { id: note.id },
            HoverTarget::Body => Gesture::Dragging {
                id: note.id,
                grab_offset: self.geometry.column_at(pos.x) - note.start as i64,
            },
            HoverTarget::Empty => Gesture::Idle,
        };
        self.gesture != Gesture::Idle
    }

    /// Follow the pointer while dragging or resizing. Returns true when the
    /// store changed.
    pub fn pointer_move(&mut self, store: &mut NoteStore, pos: Pos2) -> bool {
        match self.gesture {
            Gesture::Idle => false,
            Gesture::Dragging { id, grab_offset } => {
                let column = (self.geometry.column_at(pos.x) - grab_offset).max(0);
                let row = self.geometry.row_at(pos.y).clamp(0, PITCH_COUNT as i64 - 1);
                store.move_note(id, u32::try_from(column).unwrap_or(u32::MAX), row as usize)
            }
            Gesture::Resizing { id } => {
                let Some(start) = store.get(id).map(|n| n.start as i64) else {
                    return false;
                };
                // the note ends where the pointer's cell begins, so hovering
                // inside the last cell leaves it one column shorter
                let duration = (self.geometry.column_at(pos.x) - start).max(1);
                store.resize_note(id, u32::try_from(duration).unwrap_or(u32::MAX))
            }
        }
    }

    pub fn pointer_up(&mut self) {
        self.gesture = Gesture::Idle;
    }
}
