use egui::{Color32, CursorIcon, PointerButton, Pos2, Rect, Sense, Shape, Stroke, Ui, Vec2};

use crate::core::editor::{Gesture, HoverTarget, InputController};
use crate::core::grid::{GridGeometry, COLUMNS_PER_BAR, COLUMNS_PER_BEAT};
use crate::core::pitch::{Pitch, PITCH_COUNT};
use crate::core::store::NoteStore;

const BACKGROUND: Color32 = Color32::from_rgb(34, 36, 40);
const SHARP_ROW: Color32 = Color32::from_rgb(28, 29, 33);
const CELL_LINE: Color32 = Color32::from_rgb(48, 50, 56);
const BEAT_LINE: Color32 = Color32::from_rgb(66, 69, 76);
const BAR_LINE: Color32 = Color32::from_rgb(100, 104, 112);
const NOTE_FILL: Color32 = Color32::from_rgb(0, 170, 200);
const NOTE_SELECTED: Color32 = Color32::from_rgb(255, 160, 40);
const HANDLE_MARK: Color32 = Color32::from_rgb(20, 20, 24);
const PLAYHEAD: Color32 = Color32::from_rgb(240, 70, 70);

/// Shapes cached against the value that produced them
struct Layer<K> {
    key: Option<K>,
    shapes: Vec<Shape>,
}

impl<K: PartialEq + Copy> Layer<K> {
    fn new() -> Self {
        Self { key: None, shapes: Vec::new() }
    }

    fn get_or_build(&mut self, key: K, build: impl FnOnce() -> Vec<Shape>) -> &[Shape] {
        if self.key != Some(key) {
            self.shapes = build();
            self.key = Some(key);
        }
        &self.shapes
    }
}

/// The grid editor: a static background layer rebuilt only when the grid
/// width changes and a note layer rebuilt whenever the store changes.
pub struct PianoRoll {
    grid_layer: Layer<u32>,
    note_layer: Layer<u64>,
}

#[derive(Debug, Default)]
pub struct PianoRollOutput {
    /// Pitch of a note that was just clicked or created
    pub preview: Option<Pitch>,
}

impl Default for PianoRoll {
    fn default() -> Self {
        Self::new()
    }
}

impl PianoRoll {
    pub fn new() -> Self {
        Self {
            grid_layer: Layer::new(),
            note_layer: Layer::new(),
        }
    }

    pub fn show(
        &mut self,
        ui: &mut Ui,
        store: &mut NoteStore,
        controller: &mut InputController,
        playhead: Option<f64>,
    ) -> PianoRollOutput {
        let geometry = *controller.geometry();
        let (rect, response) = ui.allocate_exact_size(geometry.size(store.columns()), Sense::click_and_drag());
        let to_local = |pos: Pos2| (pos - rect.min).to_pos2();
        let mut output = PianoRollOutput::default();

        if response.hovered() && ui.input(|i| i.pointer.primary_pressed()) {
            if let Some(pos) = response.interact_pointer_pos().or_else(|| response.hover_pos()) {
                controller.pointer_down(store, to_local(pos));
            }
        }
        if response.dragged_by(PointerButton::Primary) {
            if let Some(pos) = response.interact_pointer_pos() {
                controller.pointer_move(store, to_local(pos));
            }
        }
        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                output.preview = controller.click(store, to_local(pos));
            }
        }
        if ui.input(|i| i.pointer.primary_released()) {
            controller.pointer_up();
        }

        let cursor = match controller.gesture() {
            Gesture::Resizing { .. } => Some(CursorIcon::ResizeHorizontal),
            Gesture::Dragging { .. } => Some(CursorIcon::Grabbing),
            Gesture::Idle => response.hover_pos().and_then(|pos| {
                match controller.hover_target(store, to_local(pos)) {
                    HoverTarget::ResizeHandle => Some(CursorIcon::ResizeHorizontal),
                    HoverTarget::Body => Some(CursorIcon::Grab),
                    HoverTarget::Empty => None,
                }
            }),
        };
        if let Some(cursor) = cursor {
            ui.ctx().set_cursor_icon(cursor);
        }

        if ui.is_rect_visible(rect) {
            let painter = ui.painter_at(rect);
            let offset = rect.min.to_vec2();
            let columns = store.columns();

            let grid = self.grid_layer.get_or_build(columns, || grid_shapes(&geometry, columns));
            painter.extend(grid.iter().cloned().map(|mut s| {
                s.translate(offset);
                s
            }));

            let notes = self.note_layer.get_or_build(store.revision(), || note_shapes(&geometry, store));
            painter.extend(notes.iter().cloned().map(|mut s| {
                s.translate(offset);
                s
            }));

            if let Some(column) = playhead {
                let x = rect.min.x + column as f32 * geometry.cell_size;
                painter.line_segment([Pos2::new(x, rect.min.y), Pos2::new(x, rect.max.y)], Stroke::new(2.0, PLAYHEAD));
            }
        }

        output
    }
}

fn grid_shapes(geometry: &GridGeometry, columns: u32) -> Vec<Shape> {
    let size = geometry.size(columns);
    let cell = geometry.cell_size;
    let mut shapes = vec![Shape::rect_filled(Rect::from_min_size(Pos2::ZERO, size), 0.0, BACKGROUND)];

    for pitch in Pitch::all().filter(|p| p.is_sharp()) {
        let y = pitch.row() as f32 * cell;
        shapes.push(Shape::rect_filled(
            Rect::from_min_size(Pos2::new(0.0, y), Vec2::new(size.x, cell)),
            0.0,
            SHARP_ROW,
        ));
    }

    for row in 0..=PITCH_COUNT {
        let y = row as f32 * cell;
        shapes.push(Shape::line_segment([Pos2::new(0.0, y), Pos2::new(size.x, y)], Stroke::new(1.0, CELL_LINE)));
    }

    for column in 0..=columns {
        let x = column as f32 * cell;
        let stroke = if column % COLUMNS_PER_BAR == 0 {
            Stroke::new(1.5, BAR_LINE)
        } else if column % COLUMNS_PER_BEAT == 0 {
            Stroke::new(1.0, BEAT_LINE)
        } else {
            Stroke::new(1.0, CELL_LINE)
        };
        shapes.push(Shape::line_segment([Pos2::new(x, 0.0), Pos2::new(x, size.y)], stroke));
    }

    shapes
}

fn note_shapes(geometry: &GridGeometry, store: &NoteStore) -> Vec<Shape> {
    let mut shapes = Vec::with_capacity(store.len() * 2);
    for note in store.notes() {
        let fill = if store.selected() == Some(note.id) { NOTE_SELECTED } else { NOTE_FILL };
        let body = geometry.note_rect(note).shrink(1.0);
        shapes.push(Shape::rect_filled(body, 2.0, fill));

        let handle = geometry.handle_rect(note).shrink2(Vec2::new(1.5, geometry.cell_size * 0.3));
        shapes.push(Shape::rect_filled(handle, 1.0, HANDLE_MARK));
    }
    shapes
}
