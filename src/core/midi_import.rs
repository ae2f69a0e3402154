//! Standard MIDI file import.
//!
//! Decoding turns every track into notes timed in seconds; conversion then
//! maps those onto grid columns with a fixed columns-per-second factor.

use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};

use crate::core::grid::MAX_COLUMNS;
use crate::core::note::NoteSpec;
use crate::core::pitch::{Pitch, NOTE_NAMES};
use crate::core::playback::seconds_per_column;
use crate::core::store::NoteStore;

/// Microseconds per quarter note when a file sets no tempo (120 BPM)
const DEFAULT_TEMPO: u32 = 500_000;

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedNote {
    /// Scientific pitch name, e.g. `C#4`
    pub name: String,
    /// Start in seconds
    pub time: f64,
    /// Length in seconds
    pub duration: f64,
}

#[derive(Debug, Clone, Default)]
pub struct DecodedTrack {
    pub name: Option<String>,
    pub notes: Vec<DecodedNote>,
}

/// Name for any MIDI key number, including ones outside the grid
pub fn midi_note_name(key: u8) -> String {
    format!("{}{}", NOTE_NAMES[(key % 12) as usize], key as i32 / 12 - 1)
}

/// Converts ticks to seconds through a tempo map
struct TickClock {
    /// (tick, microseconds per quarter) sorted by tick
    tempos: Vec<(u64, u32)>,
    ticks_per_beat: Option<f64>,
    seconds_per_tick: f64,
}

impl TickClock {
    fn new(smf: &Smf<'_>) -> Self {
        let mut tempos = Vec::new();
        for track in &smf.tracks {
            let mut tick = 0u64;
            for event in track {
                tick += event.delta.as_int() as u64;
                if let TrackEventKind::Meta(MetaMessage::Tempo(tempo)) = event.kind {
                    tempos.push((tick, tempo.as_int()));
                }
            }
        }
        tempos.sort_by_key(|(tick, _)| *tick);

        match smf.header.timing {
            Timing::Metrical(tpb) => Self {
                tempos,
                ticks_per_beat: Some(tpb.as_int().max(1) as f64),
                seconds_per_tick: 0.0,
            },
            Timing::Timecode(fps, subframes) => Self {
                tempos,
                ticks_per_beat: None,
                seconds_per_tick: 1.0 / (fps.as_f32() as f64 * subframes.max(1) as f64),
            },
        }
    }

    fn seconds(&self, tick: u64) -> f64 {
        let Some(tpb) = self.ticks_per_beat else {
            return tick as f64 * self.seconds_per_tick;
        };
        let mut seconds = 0.0;
        let mut last_tick = 0u64;
        let mut tempo = DEFAULT_TEMPO;
        for &(change_tick, change_tempo) in &self.tempos {
            if change_tick >= tick {
                break;
            }
            seconds += (change_tick - last_tick) as f64 * tempo as f64 / 1_000_000.0 / tpb;
            last_tick = change_tick;
            tempo = change_tempo;
        }
        seconds + (tick - last_tick) as f64 * tempo as f64 / 1_000_000.0 / tpb
    }
}

/// Parse a standard MIDI file into per-track notes
pub fn decode(bytes: &[u8]) -> Result<Vec<DecodedTrack>> {
    let smf = Smf::parse(bytes).context("Failed to parse MIDI file")?;
    let clock = TickClock::new(&smf);

    let mut tracks = Vec::with_capacity(smf.tracks.len());
    for track in &smf.tracks {
        let mut decoded = DecodedTrack::default();
        let mut tick = 0u64;
        // open note-on ticks per key
        let mut open: Vec<Vec<u64>> = vec![Vec::new(); 128];
        let mut spans: Vec<(u8, u64, u64)> = Vec::new();

        for event in track {
            tick += event.delta.as_int() as u64;
            match event.kind {
                TrackEventKind::Midi { message, .. } => match message {
                    MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                        open[key.as_int() as usize].push(tick);
                    }
                    MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                        let key = key.as_int();
                        if !open[key as usize].is_empty() {
                            let start = open[key as usize].remove(0);
                            spans.push((key, start, tick));
                        }
                    }
                    _ => {}
                },
                TrackEventKind::Meta(MetaMessage::TrackName(name)) if decoded.name.is_none() => {
                    decoded.name = Some(String::from_utf8_lossy(name).to_string());
                }
                _ => {}
            }
        }

        // notes never switched off end with the track
        for (key, starts) in open.iter().enumerate() {
            for &start in starts {
                spans.push((key as u8, start, tick));
            }
        }
        spans.sort_by_key(|&(key, start, _)| (start, key));

        decoded.notes = spans
            .into_iter()
            .map(|(key, start, end)| {
                let time = clock.seconds(start);
                DecodedNote {
                    name: midi_note_name(key),
                    time,
                    duration: clock.seconds(end) - time,
                }
            })
            .collect();
        debug!("decoded track {:?} with {} notes", decoded.name, decoded.notes.len());
        tracks.push(decoded);
    }

    Ok(tracks)
}

/// Map decoded notes onto the grid, dropping pitches the grid cannot show
/// and notes starting past the last column
pub fn to_grid(tracks: &[DecodedTrack], bpm: f32) -> Vec<NoteSpec> {
    let columns_per_second = 1.0 / seconds_per_column(bpm);
    let limit = MAX_COLUMNS as f64;
    let mut too_late = 0;
    let notes: Vec<NoteSpec> = tracks
        .iter()
        .flat_map(|track| track.notes.iter())
        .filter_map(|note| {
            let pitch = note.name.parse::<Pitch>().ok()?;
            let start = (note.time * columns_per_second).round().max(0.0);
            if start >= limit {
                too_late += 1;
                return None;
            }
            let duration = (note.duration * columns_per_second)
                .round()
                .clamp(1.0, limit - start);
            Some(NoteSpec::new(pitch, start as u32, duration as u32))
        })
        .collect();
    if too_late > 0 {
        warn!("dropped {} notes starting after column {}", too_late, MAX_COLUMNS);
    }
    notes
}

/// Decode `bytes` and replace the whole score with the result.
/// On error the store is left untouched.
pub fn import_bytes(store: &mut NoteStore, bytes: &[u8], bpm: f32) -> Result<usize> {
    let tracks = decode(bytes)?;
    let decoded: usize = tracks.iter().map(|t| t.notes.len()).sum();
    let notes = to_grid(&tracks, bpm);
    if notes.len() < decoded {
        debug!("dropped {} notes outside the grid range", decoded - notes.len());
    }
    let loaded = store.replace_all(notes);
    info!("imported {} notes from {} tracks", loaded, tracks.len());
    Ok(loaded)
}

pub fn import_file(store: &mut NoteStore, path: &Path, bpm: f32) -> Result<usize> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    import_bytes(store, &bytes, bpm).with_context(|| format!("Failed to import {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::INITIAL_COLUMNS;
    use midly::num::{u15, u24, u28, u4, u7};
    use midly::{Format, Header, Track, TrackEvent};

    /// (tick, key, on) events in any order, written as a single-track file
    fn smf_bytes(ticks_per_beat: u16, tempo: Option<u32>, events: &[(u32, u8, bool)]) -> Vec<u8> {
        let mut timed: Vec<(u32, TrackEventKind<'static>)> = Vec::new();
        if let Some(tempo) = tempo {
            timed.push((0, TrackEventKind::Meta(MetaMessage::Tempo(u24::new(tempo)))));
        }
        for &(tick, key, on) in events {
            let key = u7::new(key);
            let message = if on {
                MidiMessage::NoteOn { key, vel: u7::new(100) }
            } else {
                MidiMessage::NoteOff { key, vel: u7::new(0) }
            };
            timed.push((tick, TrackEventKind::Midi { channel: u4::new(0), message }));
        }
        timed.sort_by_key(|(tick, _)| *tick);

        let mut track: Track<'static> = Vec::new();
        let mut last = 0;
        for (tick, kind) in timed {
            track.push(TrackEvent { delta: u28::new(tick - last), kind });
            last = tick;
        }
        track.push(TrackEvent { delta: u28::new(0), kind: TrackEventKind::Meta(MetaMessage::EndOfTrack) });

        let smf = Smf {
            header: Header::new(Format::SingleTrack, Timing::Metrical(u15::new(ticks_per_beat))),
            tracks: vec![track],
        };
        let mut buffer = Vec::new();
        smf.write(&mut buffer).unwrap();
        buffer
    }

    #[test]
    fn names_cover_the_full_midi_range() {
        assert_eq!(midi_note_name(0), "C-1");
        assert_eq!(midi_note_name(60), "C4");
        assert_eq!(midi_note_name(127), "G9");
    }

    #[test]
    fn decodes_seconds_with_default_tempo() {
        // 480 ticks per beat at 120 BPM: one beat is half a second
        let bytes = smf_bytes(480, None, &[(0, 60, true), (480, 60, false), (480, 64, true), (1440, 64, false)]);
        let tracks = decode(&bytes).unwrap();
        assert_eq!(tracks.len(), 1);
        let notes = &tracks[0].notes;
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].name, "C4");
        assert!((notes[0].time - 0.0).abs() < 1e-9);
        assert!((notes[0].duration - 0.5).abs() < 1e-9);
        assert_eq!(notes[1].name, "E4");
        assert!((notes[1].time - 0.5).abs() < 1e-9);
        assert!((notes[1].duration - 1.0).abs() < 1e-9);
    }

    #[test]
    fn honours_file_tempo() {
        // 60 BPM: one beat is a second
        let bytes = smf_bytes(96, Some(1_000_000), &[(96, 67, true), (192, 67, false)]);
        let notes = &decode(&bytes).unwrap()[0].notes;
        assert!((notes[0].time - 1.0).abs() < 1e-9);
        assert!((notes[0].duration - 1.0).abs() < 1e-9);
    }

    #[test]
    fn import_converts_to_columns_and_replaces() {
        let bytes = smf_bytes(480, None, &[(0, 60, true), (480, 60, false), (480, 64, true), (1440, 64, false)]);
        let mut store = NoteStore::new();
        store.add(NoteSpec::new(Pitch::C4, 30, 1));
        assert_eq!(import_bytes(&mut store, &bytes, 120.0).unwrap(), 2);
        let notes = store.notes();
        assert_eq!(notes.len(), 2);
        assert_eq!((notes[0].pitch.name(), notes[0].start, notes[0].duration), ("C4".to_string(), 0, 4));
        assert_eq!((notes[1].pitch.name(), notes[1].start, notes[1].duration), ("E4".to_string(), 4, 8));
    }

    #[test]
    fn out_of_range_pitches_are_dropped() {
        // C0 and G9 are outside C1..B7
        let bytes = smf_bytes(480, None, &[(0, 12, true), (0, 127, true), (0, 60, true), (240, 12, false), (240, 127, false), (240, 60, false)]);
        let mut store = NoteStore::new();
        assert_eq!(import_bytes(&mut store, &bytes, 120.0).unwrap(), 1);
        assert_eq!(store.notes()[0].pitch, Pitch::C4);
    }

    #[test]
    fn nothing_matching_leaves_empty_store_and_width() {
        let bytes = smf_bytes(480, None, &[(0, 5, true), (480, 5, false), (4800, 120, true), (9600, 120, false)]);
        let mut store = NoteStore::new();
        store.add(NoteSpec::new(Pitch::C4, 3, 1));
        let width = store.columns();
        assert_eq!(import_bytes(&mut store, &bytes, 120.0).unwrap(), 0);
        assert!(store.is_empty());
        assert_eq!(store.columns(), width);
    }

    #[test]
    fn long_files_widen_the_grid() {
        // starts at beat 50 = column 200
        let bytes = smf_bytes(480, None, &[(24_000, 60, true), (24_480, 60, false)]);
        let mut store = NoteStore::new();
        import_bytes(&mut store, &bytes, 120.0).unwrap();
        assert_eq!(store.notes()[0].start, 200);
        assert!(store.columns() > 204);
        assert!(store.columns() > INITIAL_COLUMNS);
    }

    #[test]
    fn notes_past_the_column_limit_are_dropped_or_cut() {
        // slowest tempo, one tick per beat: the late note lands millions of columns out
        let bytes = smf_bytes(
            1,
            Some(16_777_215),
            &[(0, 60, true), (268_435_455, 60, false), (268_435_455, 62, true), (268_435_455, 62, false)],
        );
        let mut store = NoteStore::new();
        assert_eq!(import_bytes(&mut store, &bytes, 120.0).unwrap(), 1);
        let note = &store.notes()[0];
        assert_eq!((note.pitch, note.start), (Pitch::C4, 0));
        assert_eq!(note.end(), MAX_COLUMNS);
        assert!(store.columns() <= MAX_COLUMNS + crate::core::grid::GROW_COLUMNS);
    }

    #[test]
    fn parse_failure_leaves_store_untouched() {
        let mut store = NoteStore::new();
        store.add(NoteSpec::new(Pitch::C4, 3, 2));
        let revision = store.revision();
        assert!(import_bytes(&mut store, b"definitely not a midi file", 120.0).is_err());
        assert_eq!(store.len(), 1);
        assert_eq!(store.revision(), revision);
    }

    #[test]
    fn unterminated_notes_end_with_the_track() {
        let bytes = smf_bytes(480, None, &[(0, 60, true), (960, 62, true), (1920, 62, false)]);
        let notes = &decode(&bytes).unwrap()[0].notes;
        assert_eq!(notes.len(), 2);
        let c4 = notes.iter().find(|n| n.name == "C4").unwrap();
        assert!((c4.duration - 2.0).abs() < 1e-9);
    }
}
