use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use crate::core::audio::VoiceSettings;
use crate::core::note::Note;
use crate::core::playback::seconds_per_column;
use crate::messaging::EngineMessage;

pub const EXPORT_SAMPLE_RATE: u32 = 44_100;

/// Render the score offline with the same voices used for live playback
pub fn render_notes(notes: &[Note], bpm: f32, voice: &VoiceSettings, sample_rate: u32) -> Vec<f32> {
    let Some(last_end) = notes.iter().map(Note::end).max() else {
        return Vec::new();
    };
    let spc = seconds_per_column(bpm);
    let mut bank = voice.bank(sample_rate as f32);
    for note in notes {
        bank.handle(EngineMessage::ScheduleNote {
            pitch: note.pitch,
            duration: note.duration as f64 * spc,
            when: note.start as f64 * spc,
        });
    }

    let tail = voice.envelope.clamped().release as f64;
    let total = ((last_end as f64 * spc + tail) * sample_rate as f64).ceil() as usize;
    (0..total).map(|_| bank.next_sample()).collect()
}

pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for &sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer.write_sample(value)?;
    }
    writer.finalize().context("Failed to finish WAV file")?;
    info!("wrote {} samples to {}", samples.len(), path.display());
    Ok(())
}

pub fn export_wav(path: &Path, notes: &[Note], bpm: f32, voice: &VoiceSettings) -> Result<()> {
    let samples = render_notes(notes, bpm, voice, EXPORT_SAMPLE_RATE);
    write_wav(path, &samples, EXPORT_SAMPLE_RATE)
}
