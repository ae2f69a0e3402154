use egui::{Align2, Color32, FontId, Painter, Pos2, Sense, Shape, Stroke, Ui, Vec2};

use crate::core::staff::{is_treble, steps_above_bottom, NoteValue, StaffNote, UNITS_PER_MEASURE};

const LINE_SPACING: f32 = 10.0;
const UNIT_WIDTH: f32 = 44.0;
const LEFT_MARGIN: f32 = 48.0;
const STAFF_GAP: f32 = 70.0;
const TOP_MARGIN: f32 = 50.0;
const HEAD_RADIUS: f32 = 4.5;
const STEM_LENGTH: f32 = 30.0;

/// Treble and bass staves drawn from laid-out staff notes
pub struct StaffView {
    ink: Color32,
}

impl Default for StaffView {
    fn default() -> Self {
        Self { ink: Color32::from_gray(20) }
    }
}

impl StaffView {
    pub fn show(&self, ui: &mut Ui, notes: &[StaffNote]) {
        let total_units = notes
            .iter()
            .map(|n| n.start + n.units)
            .fold(UNITS_PER_MEASURE * 4.0, f32::max);
        let measures = (total_units / UNITS_PER_MEASURE).ceil();
        let width = LEFT_MARGIN + measures * UNITS_PER_MEASURE * UNIT_WIDTH + 20.0;
        let height = TOP_MARGIN * 2.0 + STAFF_GAP + 8.0 * LINE_SPACING;

        let (rect, _response) = ui.allocate_exact_size(Vec2::new(width, height), Sense::hover());
        if !ui.is_rect_visible(rect) {
            return;
        }
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 4.0, Color32::from_rgb(250, 248, 240));

        let treble_top = rect.min.y + TOP_MARGIN;
        let bass_top = treble_top + 4.0 * LINE_SPACING + STAFF_GAP;
        let stroke = Stroke::new(1.0, self.ink);

        for (top, clef) in [(treble_top, "G"), (bass_top, "F")] {
            for line in 0..5 {
                let y = top + line as f32 * LINE_SPACING;
                painter.line_segment([Pos2::new(rect.min.x + 8.0, y), Pos2::new(rect.max.x - 8.0, y)], stroke);
            }
            painter.text(
                Pos2::new(rect.min.x + 22.0, top + 2.0 * LINE_SPACING),
                Align2::CENTER_CENTER,
                clef,
                FontId::proportional(26.0),
                self.ink,
            );
        }

        for measure in 0..=measures as usize {
            let x = rect.min.x + LEFT_MARGIN + measure as f32 * UNITS_PER_MEASURE * UNIT_WIDTH;
            painter.line_segment([Pos2::new(x, treble_top), Pos2::new(x, bass_top + 4.0 * LINE_SPACING)], stroke);
        }

        for (i, note) in notes.iter().enumerate() {
            let top = if is_treble(note.pitch) { treble_top } else { bass_top };
            let bottom = top + 4.0 * LINE_SPACING;
            let steps = steps_above_bottom(note.pitch);
            let center = Pos2::new(
                rect.min.x + LEFT_MARGIN + (note.start + 0.5) * UNIT_WIDTH,
                bottom - steps as f32 * LINE_SPACING / 2.0,
            );
            self.draw_ledger_lines(&painter, center.x, bottom, steps);
            self.draw_note(&painter, center, note);

            if note.tied {
                // the continuation always directly follows a tied piece
                if let Some(next) = notes.get(i + 1) {
                    let end_x = rect.min.x + LEFT_MARGIN + (next.start + 0.5) * UNIT_WIDTH;
                    painter.add(tie_arc(center, end_x, stroke));
                }
            }
        }
    }

    fn draw_ledger_lines(&self, painter: &Painter, x: f32, bottom: f32, steps: i32) {
        let stroke = Stroke::new(1.0, self.ink);
        let ledger = |step: i32| {
            let y = bottom - step as f32 * LINE_SPACING / 2.0;
            painter.line_segment([Pos2::new(x - 8.0, y), Pos2::new(x + 8.0, y)], stroke);
        };
        let mut step = -2;
        while step >= steps {
            ledger(step);
            step -= 2;
        }
        let mut step = 10;
        while step <= steps {
            ledger(step);
            step += 2;
        }
    }

    fn draw_note(&self, painter: &Painter, center: Pos2, note: &StaffNote) {
        let stroke = Stroke::new(1.5, self.ink);
        if note.value.is_filled() {
            painter.circle_filled(center, HEAD_RADIUS, self.ink);
        } else {
            painter.circle_stroke(center, HEAD_RADIUS, stroke);
        }

        if note.pitch.is_sharp() {
            painter.text(
                Pos2::new(center.x - HEAD_RADIUS - 3.0, center.y),
                Align2::RIGHT_CENTER,
                "#",
                FontId::proportional(12.0),
                self.ink,
            );
        }

        if note.value.has_stem() {
            // stems point down on the upper half of a staff
            let up = steps_above_bottom(note.pitch) < 4;
            let (x, dir) = if up { (center.x + HEAD_RADIUS, -1.0) } else { (center.x - HEAD_RADIUS, 1.0) };
            let tip = Pos2::new(x, center.y + dir * STEM_LENGTH);
            painter.line_segment([Pos2::new(x, center.y), tip], stroke);
            if note.value == NoteValue::Eighth {
                painter.line_segment([tip, Pos2::new(tip.x + 7.0, tip.y - dir * 10.0)], stroke);
            }
        }
    }
}

fn tie_arc(start: Pos2, end_x: f32, stroke: Stroke) -> Shape {
    let width = end_x - start.x;
    let points = (0..=12)
        .map(|i| {
            let t = i as f32 / 12.0;
            let lift = (t * std::f32::consts::PI).sin() * 6.0;
            Pos2::new(start.x + t * width, start.y + HEAD_RADIUS + 3.0 + lift)
        })
        .collect();
    Shape::line(points, stroke)
}
