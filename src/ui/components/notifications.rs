use egui::{Align2, Color32, Context, RichText};

const DEFAULT_TTL: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub text: String,
    pub level: Level,
    /// Seconds until it disappears
    pub remaining: f32,
}

/// Transient messages stacked in the bottom-right corner
#[derive(Debug, Default)]
pub struct Notifications {
    items: Vec<Notification>,
}

impl Notifications {
    pub fn info(&mut self, text: impl Into<String>) {
        self.push(text.into(), Level::Info);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.push(text.into(), Level::Error);
    }

    fn push(&mut self, text: String, level: Level) {
        self.items.push(Notification {
            text,
            level,
            remaining: DEFAULT_TTL,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    /// Age every message by `dt` seconds and drop the expired ones
    pub fn update(&mut self, dt: f32) {
        for item in &mut self.items {
            item.remaining -= dt;
        }
        self.items.retain(|n| n.remaining > 0.0);
    }

    pub fn show(&self, ctx: &Context) {
        if self.items.is_empty() {
            return;
        }
        egui::Area::new(egui::Id::new("notifications"))
            .anchor(Align2::RIGHT_BOTTOM, [-12.0, -12.0])
            .show(ctx, |ui| {
                for item in &self.items {
                    let color = match item.level {
                        Level::Info => Color32::from_rgb(0, 200, 200),
                        Level::Error => Color32::from_rgb(240, 80, 80),
                    };
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.label(RichText::new(&item.text).color(color));
                    });
                }
            });
    }
}
