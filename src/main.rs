use eframe::egui;
use anyhow::Result;

mod app;
mod config;
mod core;
mod messaging;
mod ui;
mod utils;

fn main() -> Result<()> {
    env_logger::init();
    log::info!("Starting Piano Grid");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 900.0])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Piano Grid",
        options,
        Box::new(|_cc| Ok(Box::new(app::PianoGridApp::new()))),
    ).map_err(|e| anyhow::anyhow!("Application error: {}", e))
}
