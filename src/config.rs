use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::core::audio::{Envelope, VoiceSettings, Waveform};
use crate::core::playback::DEFAULT_BPM;

pub const MIN_BPM: f32 = 30.0;
pub const MAX_BPM: f32 = 300.0;

/// Persisted user preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub bpm: f32,
    pub volume: f32,
    pub waveform: Waveform,
    pub envelope: Envelope,
    pub show_staff: bool,
    pub last_midi_dir: Option<PathBuf>,
    pub midi_input_port: Option<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            volume: 0.5,
            waveform: Waveform::Triangle,
            envelope: Envelope::default(),
            show_staff: false,
            last_midi_dir: None,
            midi_input_port: None,
        }
    }
}

impl AppSettings {
    /// Clamp values a hand-edited file might have pushed out of range
    pub fn sanitized(mut self) -> Self {
        if !self.bpm.is_finite() {
            self.bpm = DEFAULT_BPM;
        }
        self.bpm = self.bpm.clamp(MIN_BPM, MAX_BPM);
        if !self.volume.is_finite() {
            self.volume = 0.5;
        }
        self.volume = self.volume.clamp(0.0, 1.0);
        self.envelope = self.envelope.clamped();
        self
    }

    pub fn voice(&self) -> VoiceSettings {
        VoiceSettings {
            waveform: self.waveform,
            volume: self.volume,
            envelope: self.envelope,
        }
    }

    pub fn settings_dir() -> Result<PathBuf> {
        let mut path = dirs::config_dir().context("Could not find config directory")?;
        path.push("piano-grid");
        Ok(path)
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::settings_dir()?.join("settings.json"))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("no settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let settings: Self = serde_json::from_reader(file)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(settings.sanitized())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load from the user config directory, falling back to defaults
    pub fn load() -> Self {
        match Self::default_path().and_then(|path| Self::load_from(&path)) {
            Ok(settings) => settings,
            Err(err) => {
                warn!("Failed to load settings, using defaults: {:#}", err);
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path()?)
    }
}
