/// Convert a MIDI note number to its frequency in Hz
pub fn midi_note_to_freq(note: u8) -> f32 {
    // A4 (note 69) is 440 Hz
    440.0 * 2.0f32.powf((note as f32 - 69.0) / 12.0)
}

/// Convert a frequency in Hz to the closest MIDI note number
pub fn freq_to_midi_note(freq: f32) -> u8 {
    let note = 69.0 + 12.0 * (freq / 440.0).log2();
    note.round().clamp(0.0, 127.0) as u8
}

/// Format a frequency value with appropriate unit suffix (Hz, kHz)
pub fn format_frequency(freq: f32) -> String {
    if freq >= 1000.0 {
        format!("{:.2} kHz", freq / 1000.0)
    } else {
        format!("{:.1} Hz", freq)
    }
}

/// Format a time value as m:ss.t
pub fn format_time(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let minutes = (seconds / 60.0).floor();
    format!("{}:{:04.1}", minutes as u64, seconds - minutes * 60.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_is_440() {
        assert!((midi_note_to_freq(69) - 440.0).abs() < 1e-3);
        assert_eq!(freq_to_midi_note(440.0), 69);
        assert_eq!(freq_to_midi_note(261.63), 60);
    }

    #[test]
    fn formatting() {
        assert_eq!(format_frequency(440.0), "440.0 Hz");
        assert_eq!(format_frequency(1500.0), "1.50 kHz");
        assert_eq!(format_time(75.3), "1:15.3");
        assert_eq!(format_time(3.0), "0:03.0");
    }
}
