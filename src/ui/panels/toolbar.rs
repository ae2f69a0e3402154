use egui::{ComboBox, DragValue, Response, Slider, Ui};

use crate::config::{MAX_BPM, MIN_BPM};
use crate::core::audio::{Envelope, Waveform};
use crate::utils::helpers::format_time;

/// Everything the toolbar displays, borrowed from the app each frame
pub struct ToolbarState<'a> {
    pub audio_started: bool,
    pub playing: bool,
    pub elapsed: Option<f64>,
    pub note_count: usize,
    pub columns: u32,
    pub show_staff: bool,
    pub bpm: f32,
    pub volume: f32,
    pub waveform: Waveform,
    pub envelope: Envelope,
    pub midi_ports: &'a [String],
    pub midi_port: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolbarAction {
    StartAudio,
    TogglePlay,
    AddRandomNote,
    ClearAll,
    UploadMidi,
    AddPythagoreanChords,
    ExportWav,
    SetShowStaff(bool),
    SetBpm(f32),
    SetVolume(f32),
    SetWaveform(Waveform),
    SetEnvelope(Envelope),
    /// A continuous edit (drag or typed value) finished
    CommitSettings,
    RefreshMidiPorts,
    ConnectMidiInput(Option<String>),
}

impl ToolbarAction {
    /// Whether the settings file should be written after this action.
    /// Values that change every frame of a drag only save on commit.
    pub fn saves_settings(&self) -> bool {
        matches!(
            self,
            ToolbarAction::SetShowStaff(_) | ToolbarAction::SetWaveform(_) | ToolbarAction::CommitSettings
        )
    }
}

fn edit_finished(response: &Response) -> bool {
    response.drag_stopped() || response.lost_focus()
}

pub fn show(ui: &mut Ui, state: &ToolbarState<'_>) -> Vec<ToolbarAction> {
    let mut actions = Vec::new();

    ui.horizontal(|ui| {
        ui.heading("Piano Grid");
        ui.separator();

        if !state.audio_started && ui.button("🔊 Start Audio").clicked() {
            actions.push(ToolbarAction::StartAudio);
        }
        let play_label = if state.playing { "⏹ Stop" } else { "▶ Play" };
        if ui
            .add_enabled(state.audio_started, egui::Button::new(play_label))
            .on_disabled_hover_text("Start audio first")
            .clicked()
        {
            actions.push(ToolbarAction::TogglePlay);
        }
        if let Some(elapsed) = state.elapsed {
            ui.monospace(format_time(elapsed));
        }
        ui.separator();

        if ui.button("🎲 Add Random Note").clicked() {
            actions.push(ToolbarAction::AddRandomNote);
        }
        if ui.button("🗑 Clear All").clicked() {
            actions.push(ToolbarAction::ClearAll);
        }
        if ui.button("📂 Upload MIDI").clicked() {
            actions.push(ToolbarAction::UploadMidi);
        }
        if ui.button("𝄞 Add Pythagorean Chords").clicked() {
            actions.push(ToolbarAction::AddPythagoreanChords);
        }
        if ui
            .add_enabled(state.note_count > 0, egui::Button::new("💾 Export WAV"))
            .clicked()
        {
            actions.push(ToolbarAction::ExportWav);
        }

        let mut show_staff = state.show_staff;
        if ui.toggle_value(&mut show_staff, "Show Staff").changed() {
            actions.push(ToolbarAction::SetShowStaff(show_staff));
        }
    });

    ui.horizontal(|ui| {
        let mut bpm = state.bpm;
        ui.label("BPM");
        let response = ui.add(DragValue::new(&mut bpm).range(MIN_BPM..=MAX_BPM).speed(1.0));
        if response.changed() {
            actions.push(ToolbarAction::SetBpm(bpm));
        }
        let mut committed = edit_finished(&response);

        let mut volume = state.volume;
        let response = ui.add(Slider::new(&mut volume, 0.0..=1.0).text("Volume"));
        if response.changed() {
            actions.push(ToolbarAction::SetVolume(volume));
        }
        committed |= edit_finished(&response);

        let mut envelope = state.envelope;
        let attack = ui.add(
            Slider::new(&mut envelope.attack, 0.001..=Envelope::MAX_ATTACK)
                .logarithmic(true)
                .text("Attack"),
        );
        let release = ui.add(
            Slider::new(&mut envelope.release, 0.001..=Envelope::MAX_RELEASE)
                .logarithmic(true)
                .text("Release"),
        );
        if attack.changed() || release.changed() {
            actions.push(ToolbarAction::SetEnvelope(envelope));
        }
        committed |= edit_finished(&attack) || edit_finished(&release);
        if committed {
            actions.push(ToolbarAction::CommitSettings);
        }

        let mut waveform = state.waveform;
        ComboBox::from_label("Waveform")
            .selected_text(waveform.label())
            .show_ui(ui, |ui| {
                for option in Waveform::ALL {
                    ui.selectable_value(&mut waveform, option, option.label());
                }
            });
        if waveform != state.waveform {
            actions.push(ToolbarAction::SetWaveform(waveform));
        }

        ui.separator();
        let mut selected = state.midi_port.map(str::to_string);
        ComboBox::from_label("MIDI In")
            .selected_text(selected.as_deref().unwrap_or("None"))
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut selected, None, "None");
                for port in state.midi_ports {
                    ui.selectable_value(&mut selected, Some(port.clone()), port);
                }
            });
        if selected.as_deref() != state.midi_port {
            actions.push(ToolbarAction::ConnectMidiInput(selected));
        }
        if ui.small_button("⟳").on_hover_text("Refresh MIDI ports").clicked() {
            actions.push(ToolbarAction::RefreshMidiPorts);
        }

        ui.separator();
        ui.label(format!("{} notes · {} columns", state.note_count, state.columns));
    });

    actions
}
