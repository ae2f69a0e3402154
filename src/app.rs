use std::collections::HashSet;
use std::path::PathBuf;

use eframe::egui;
use log::{error, info, warn};

use crate::config::AppSettings;
use crate::core::audio::{SoundEngine, SynthEngine};
use crate::core::chords::pythagorean_notes;
use crate::core::editor::InputController;
use crate::core::grid::CELL_SIZE;
use crate::core::midi_import;
use crate::core::midi_input::{KeyEvent, MidiInputHandler};
use crate::core::playback::{seconds_per_column, Playback};
use crate::core::render;
use crate::core::staff::staff_notes;
use crate::core::{NoteStore, Pitch};
use crate::messaging::EngineMessage;
use crate::ui::components::{KeyAction, KeyboardStrip, Notifications, PianoRoll, StaffView};
use crate::ui::panels::toolbar::{self, ToolbarAction, ToolbarState};

// Main app state
pub struct PianoGridApp {
    store: NoteStore,
    controller: InputController,
    playback: Playback,
    engine: Option<SynthEngine>,
    settings: AppSettings,
    piano_roll: PianoRoll,
    keyboard: KeyboardStrip,
    staff_view: StaffView,
    notifications: Notifications,
    midi_input: MidiInputHandler,
    midi_ports: Vec<String>,
    /// Keys held on an external controller
    external_keys: HashSet<Pitch>,
}

impl eframe::App for PianoGridApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let dt = ctx.input(|i| i.stable_dt);
        self.notifications.update(dt);
        self.process_midi_input();

        if let Some(engine) = &self.engine {
            self.playback.poll(engine);
        }

        if ctx.input(|i| i.key_pressed(egui::Key::Space)) && !ctx.wants_keyboard_input() {
            self.toggle_playback();
        }

        let elapsed = self.engine.as_ref().and_then(|engine| {
            self.playback
                .position(engine)
                .map(|column| column * seconds_per_column(self.playback.bpm()))
        });
        let actions = egui::TopBottomPanel::top("toolbar")
            .show(ctx, |ui| {
                let state = ToolbarState {
                    audio_started: self.engine.is_some(),
                    playing: self.playback.is_playing(),
                    elapsed,
                    note_count: self.store.len(),
                    columns: self.store.columns(),
                    show_staff: self.settings.show_staff,
                    bpm: self.settings.bpm,
                    volume: self.settings.volume,
                    waveform: self.settings.waveform,
                    envelope: self.settings.envelope,
                    midi_ports: &self.midi_ports,
                    midi_port: self.midi_input.connected_port(),
                };
                toolbar::show(ui, &state)
            })
            .inner;
        for action in actions {
            self.handle_action(action);
        }

        if self.settings.show_staff {
            egui::TopBottomPanel::bottom("staff")
                .resizable(true)
                .default_height(260.0)
                .show(ctx, |ui| {
                    egui::ScrollArea::horizontal().show(ui, |ui| {
                        self.staff_view.show(ui, &staff_notes(self.store.notes()));
                    });
                });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_editor(ui);
        });

        self.notifications.show(ctx);

        let animating = self.playback.is_playing()
            || !self.notifications.is_empty()
            || self.keyboard.held().is_some()
            || !self.external_keys.is_empty();
        if animating {
            ctx.request_repaint();
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Some(engine) = &self.engine {
            self.playback.stop(engine);
        }
        self.midi_input.disconnect();
        self.save_settings();
    }
}

impl PianoGridApp {
    pub fn new() -> Self {
        let settings = AppSettings::load();
        info!("loaded settings: {:?}", settings);

        let mut app = PianoGridApp {
            store: NoteStore::new(),
            controller: InputController::default(),
            playback: Playback::new(settings.bpm),
            engine: None,
            piano_roll: PianoRoll::new(),
            keyboard: KeyboardStrip::new(CELL_SIZE),
            staff_view: StaffView::default(),
            notifications: Notifications::default(),
            midi_input: MidiInputHandler::new(),
            midi_ports: Vec::new(),
            external_keys: HashSet::new(),
            settings,
        };

        app.refresh_midi_ports();
        // If there was a previously selected MIDI port, try to reconnect
        if let Some(port) = app.settings.midi_input_port.clone() {
            if app.midi_ports.contains(&port) {
                app.connect_midi_input(Some(port));
            }
        }

        app
    }

    fn render_editor(&mut self, ui: &mut egui::Ui) {
        let playhead = self.engine.as_ref().and_then(|engine| self.playback.position(engine));

        let (key_actions, roll) = egui::ScrollArea::vertical()
            .id_salt("editor_vertical")
            .show(ui, |ui| {
                ui.horizontal_top(|ui| {
                    ui.spacing_mut().item_spacing.x = 0.0;
                    let key_actions = self.keyboard.show(ui, &self.external_keys);
                    let roll = egui::ScrollArea::horizontal()
                        .id_salt("editor_horizontal")
                        .show(ui, |ui| {
                            self.piano_roll
                                .show(ui, &mut self.store, &mut self.controller, playhead)
                        })
                        .inner;
                    (key_actions, roll)
                })
                .inner
            })
            .inner;

        if let Some(engine) = &self.engine {
            for action in key_actions {
                match action {
                    KeyAction::Press(pitch) => engine.trigger_attack(pitch),
                    KeyAction::Release(pitch) => engine.trigger_release(pitch),
                }
            }
            if let Some(pitch) = roll.preview {
                engine.trigger_attack_release(pitch, seconds_per_column(self.settings.bpm), engine.now());
            }
        }
    }

    fn handle_action(&mut self, action: ToolbarAction) {
        let save = action.saves_settings();
        match action {
            ToolbarAction::StartAudio => self.start_audio(),
            ToolbarAction::TogglePlay => self.toggle_playback(),
            ToolbarAction::AddRandomNote => {
                self.store.add_random(&mut rand::rng());
            },
            ToolbarAction::ClearAll => {
                if let Some(engine) = &self.engine {
                    self.playback.stop(engine);
                }
                self.store.clear();
            },
            ToolbarAction::UploadMidi => self.upload_midi(),
            ToolbarAction::AddPythagoreanChords => {
                let added = self.store.append(pythagorean_notes());
                info!("added {} Pythagorean interval notes", added);
            },
            ToolbarAction::ExportWav => self.export_wav(),
            ToolbarAction::SetShowStaff(show) => self.settings.show_staff = show,
            ToolbarAction::SetBpm(bpm) => {
                self.settings.bpm = bpm;
                self.playback.set_bpm(bpm);
            },
            ToolbarAction::SetVolume(volume) => {
                self.settings.volume = volume;
                self.send_to_engine(EngineMessage::SetVolume(volume));
            },
            ToolbarAction::SetWaveform(waveform) => {
                self.settings.waveform = waveform;
                self.send_to_engine(EngineMessage::SetWaveform(waveform));
            },
            ToolbarAction::SetEnvelope(envelope) => {
                self.settings.envelope = envelope.clamped();
                self.send_to_engine(EngineMessage::SetEnvelope(self.settings.envelope));
            },
            ToolbarAction::CommitSettings => {},
            ToolbarAction::RefreshMidiPorts => self.refresh_midi_ports(),
            ToolbarAction::ConnectMidiInput(port) => self.connect_midi_input(port),
        }
        if save {
            self.save_settings();
        }
    }

    fn start_audio(&mut self) {
        if self.engine.is_some() {
            return;
        }
        match SynthEngine::start(&self.settings.voice()) {
            Ok(engine) => {
                self.notifications.info(format!("Audio started on {} ({} Hz)", engine.device_name(), engine.sample_rate()));
                self.engine = Some(engine);
            },
            Err(err) => {
                error!("Failed to start audio: {:#}", err);
                self.notifications.error(format!("Could not start audio: {}", err));
            },
        }
    }

    fn toggle_playback(&mut self) {
        let Some(engine) = &self.engine else {
            warn!("playback requested before audio was started");
            self.notifications.error("Start audio first");
            return;
        };
        if self.playback.is_playing() {
            self.playback.stop(engine);
        } else if !self.playback.play(self.store.notes(), engine) && self.store.is_empty() {
            self.notifications.info("Nothing to play");
        }
    }

    fn upload_midi(&mut self) {
        let mut dialog = rfd::FileDialog::new().add_filter("MIDI", &["mid", "midi"]);
        if let Some(dir) = &self.settings.last_midi_dir {
            dialog = dialog.set_directory(dir);
        }
        let Some(path) = dialog.pick_file() else {
            return;
        };
        self.import_midi(path);
    }

    fn import_midi(&mut self, path: PathBuf) {
        match midi_import::import_file(&mut self.store, &path, self.settings.bpm) {
            Ok(count) => {
                if let Some(engine) = &self.engine {
                    self.playback.stop(engine);
                }
                self.notifications.info(format!("Loaded {} notes", count));
                self.settings.last_midi_dir = path.parent().map(PathBuf::from);
                self.save_settings();
            },
            Err(err) => {
                error!("MIDI import failed: {:#}", err);
                self.notifications.error("Failed to load MIDI file");
            },
        }
    }

    fn export_wav(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("WAV audio", &["wav"])
            .set_file_name("score.wav")
            .save_file()
        else {
            return;
        };
        match render::export_wav(&path, self.store.notes(), self.settings.bpm, &self.settings.voice()) {
            Ok(()) => self.notifications.info(format!("Exported {}", path.display())),
            Err(err) => {
                error!("WAV export failed: {:#}", err);
                self.notifications.error("Failed to export WAV");
            },
        }
    }

    fn refresh_midi_ports(&mut self) {
        self.midi_ports = self.midi_input.list_ports();
        info!("found {} MIDI input ports", self.midi_ports.len());
    }

    fn connect_midi_input(&mut self, port: Option<String>) {
        self.release_external_keys();
        match port {
            None => self.midi_input.disconnect(),
            Some(name) => {
                if let Err(err) = self.midi_input.connect_to_port(&name) {
                    error!("{:#}", err);
                    self.notifications.error(format!("Could not open MIDI input {}", name));
                }
            },
        }
        self.settings.midi_input_port = self.midi_input.connected_port().map(str::to_string);
        self.save_settings();
    }

    fn process_midi_input(&mut self) {
        for event in self.midi_input.drain() {
            match event {
                KeyEvent::Pressed(pitch) => {
                    self.external_keys.insert(pitch);
                    if let Some(engine) = &self.engine {
                        engine.trigger_attack(pitch);
                    }
                },
                KeyEvent::Released(pitch) => {
                    self.external_keys.remove(&pitch);
                    if let Some(engine) = &self.engine {
                        engine.trigger_release(pitch);
                    }
                },
            }
        }
    }

    fn release_external_keys(&mut self) {
        for pitch in self.external_keys.drain() {
            if let Some(engine) = &self.engine {
                engine.trigger_release(pitch);
            }
        }
    }

    fn send_to_engine(&self, msg: EngineMessage) {
        if let Some(engine) = &self.engine {
            engine.send(msg);
        }
    }

    fn save_settings(&self) {
        if let Err(err) = self.settings.save() {
            warn!("Failed to save settings: {:#}", err);
        }
    }
}
