use std::collections::HashSet;

use egui::{Align2, Color32, FontId, Pos2, Rect, Sense, Stroke, Ui, Vec2};

use crate::core::pitch::{Pitch, PITCH_COUNT};
use crate::utils::helpers::format_frequency;

pub const KEYBOARD_WIDTH: f32 = 56.0;

const WHITE_KEY: Color32 = Color32::from_rgb(230, 230, 230);
const BLACK_KEY: Color32 = Color32::from_rgb(30, 30, 30);
const PRESSED_KEY: Color32 = Color32::from_rgb(0, 170, 200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Press(Pitch),
    Release(Pitch),
}

/// Side strip of piano keys, one per grid row
pub struct KeyboardStrip {
    key_height: f32,
    held: Option<Pitch>,
}

impl KeyboardStrip {
    pub fn new(key_height: f32) -> Self {
        Self { key_height, held: None }
    }

    pub fn key_at(&self, y: f32) -> Option<Pitch> {
        if y < 0.0 {
            return None;
        }
        Pitch::from_row((y / self.key_height).floor() as usize)
    }

    /// Track the key under a held pointer, emitting press/release pairs as
    /// it slides across keys. `None` means the pointer is up or off the strip.
    pub fn update_held(&mut self, under_pointer: Option<Pitch>) -> Vec<KeyAction> {
        if under_pointer == self.held {
            return Vec::new();
        }
        let mut actions = Vec::with_capacity(2);
        if let Some(old) = self.held.take() {
            actions.push(KeyAction::Release(old));
        }
        if let Some(new) = under_pointer {
            actions.push(KeyAction::Press(new));
            self.held = Some(new);
        }
        actions
    }

    pub fn held(&self) -> Option<Pitch> {
        self.held
    }

    /// Draw the strip; `lit` holds keys sounding from other sources
    pub fn show(&mut self, ui: &mut Ui, lit: &HashSet<Pitch>) -> Vec<KeyAction> {
        let size = Vec2::new(KEYBOARD_WIDTH, PITCH_COUNT as f32 * self.key_height);
        let (rect, response) = ui.allocate_exact_size(size, Sense::click_and_drag());

        let under_pointer = if response.is_pointer_button_down_on() {
            response
                .interact_pointer_pos()
                .filter(|pos| rect.contains(*pos))
                .and_then(|pos| self.key_at(pos.y - rect.min.y))
        } else {
            None
        };
        let actions = self.update_held(under_pointer);

        if ui.is_rect_visible(rect) {
            let painter = ui.painter_at(rect);
            for pitch in Pitch::all() {
                let y = rect.min.y + pitch.row() as f32 * self.key_height;
                let key_rect = Rect::from_min_size(Pos2::new(rect.min.x, y), Vec2::new(KEYBOARD_WIDTH, self.key_height));
                let pressed = self.held == Some(pitch) || lit.contains(&pitch);
                let (fill, width) = match (pressed, pitch.is_sharp()) {
                    (true, _) => (PRESSED_KEY, KEYBOARD_WIDTH),
                    (false, true) => (BLACK_KEY, KEYBOARD_WIDTH * 0.65),
                    (false, false) => (WHITE_KEY, KEYBOARD_WIDTH),
                };
                if pitch.is_sharp() && !pressed {
                    painter.rect_filled(key_rect, 0.0, WHITE_KEY);
                }
                painter.rect_filled(
                    Rect::from_min_size(key_rect.min, Vec2::new(width, self.key_height)).shrink(0.5),
                    1.0,
                    fill,
                );
                painter.line_segment(
                    [key_rect.left_bottom(), key_rect.right_bottom()],
                    Stroke::new(0.5, Color32::from_gray(120)),
                );
                if pitch.semitone() == 0 {
                    painter.text(
                        Pos2::new(key_rect.right() - 4.0, key_rect.center().y),
                        Align2::RIGHT_CENTER,
                        pitch.name(),
                        FontId::proportional(10.0),
                        Color32::from_gray(60),
                    );
                }
            }
        }

        if let Some(pitch) = response.hover_pos().and_then(|pos| self.key_at(pos.y - rect.min.y)) {
            response.on_hover_text(format!("{} ({})", pitch, format_frequency(pitch.frequency())));
        }

        actions
    }
}
