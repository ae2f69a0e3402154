use egui::{Pos2, Rect, Vec2};

use crate::core::note::Note;
use crate::core::pitch::PITCH_COUNT;

pub const CELL_SIZE: f32 = 20.0;
/// Width of the grab zone at the trailing edge of a note
pub const RESIZE_HANDLE_WIDTH: f32 = 6.0;
pub const INITIAL_COLUMNS: u32 = 64;
pub const GROW_COLUMNS: u32 = 50;
/// No note may end past this column (about 40 minutes at 120 BPM)
pub const MAX_COLUMNS: u32 = 20_000;
/// One column is a sixteenth note
pub const COLUMNS_PER_BEAT: u32 = 4;
pub const COLUMNS_PER_BAR: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub column: u32,
    pub row: usize,
}

/// Pixel layout of the piano roll, with positions relative to the grid's
/// top-left corner.
#[derive(Debug, Clone, Copy)]
pub struct GridGeometry {
    pub cell_size: f32,
    pub handle_width: f32,
}

impl Default for GridGeometry {
    fn default() -> Self {
        Self {
            cell_size: CELL_SIZE,
            handle_width: RESIZE_HANDLE_WIDTH,
        }
    }
}

impl GridGeometry {
    /// Column under `x`, possibly negative when the pointer is left of the grid
    pub fn column_at(&self, x: f32) -> i64 {
        (x / self.cell_size).floor() as i64
    }

    pub fn row_at(&self, y: f32) -> i64 {
        (y / self.cell_size).floor() as i64
    }

    /// Grid cell under a position, if the position is on the grid rows
    pub fn cell_at(&self, pos: Pos2) -> Option<Cell> {
        let column = self.column_at(pos.x);
        let row = self.row_at(pos.y);
        if column < 0 || row < 0 || row as usize >= PITCH_COUNT {
            return None;
        }
        Some(Cell {
            column: u32::try_from(column).ok()?,
            row: row as usize,
        })
    }

    pub fn size(&self, columns: u32) -> Vec2 {
        Vec2::new(columns as f32 * self.cell_size, PITCH_COUNT as f32 * self.cell_size)
    }

    pub fn note_rect(&self, note: &Note) -> Rect {
        Rect::from_min_size(
            Pos2::new(note.start as f32 * self.cell_size, note.row() as f32 * self.cell_size),
            Vec2::new(note.duration as f32 * self.cell_size, self.cell_size),
        )
    }

    pub fn handle_rect(&self, note: &Note) -> Rect {
        let rect = self.note_rect(note);
        Rect::from_min_max(Pos2::new(rect.max.x - self.handle_width, rect.min.y), rect.max)
    }

    pub fn in_resize_handle(&self, note: &Note, pos: Pos2) -> bool {
        self.handle_rect(note).contains(pos)
    }

    pub fn in_body(&self, note: &Note, pos: Pos2) -> bool {
        self.note_rect(note).contains(pos)
    }
}
