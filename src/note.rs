//! Note events and pitch utilities.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single note to render: where it sits on the timeline and how it sounds.
///
/// Produced by an external note source (e.g. a MIDI decoder) and treated as
/// immutable by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// Index of the track this note belongs to.
    pub track: usize,
    /// Start time on the timeline, in seconds.
    pub start: f64,
    /// Note length in seconds.
    pub duration: f64,
    /// MIDI note number (0-127).
    pub pitch: u8,
    /// MIDI velocity (0-127).
    pub velocity: u8,
}

impl NoteEvent {
    pub fn new(track: usize, start: f64, duration: f64, pitch: u8, velocity: u8) -> Self {
        NoteEvent {
            track,
            start,
            duration,
            pitch,
            velocity,
        }
    }

    /// End time of the note on the timeline, in seconds.
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Convert a MIDI note number to frequency using the given tuning pitch.
///
/// `tuning_pitch` is the frequency of A4 (MIDI 69). Default is 440.0 Hz.
/// Formula: `tuning_pitch * 2^((midi - 69) / 12)`
pub fn midi_to_frequency(midi: i32, tuning_pitch: f64) -> f64 {
    tuning_pitch * (2.0_f64).powf((midi as f64 - 69.0) / 12.0)
}

/// MIDI note number to frequency at standard A4 = 440 Hz tuning.
pub fn midi_to_freq(midi: u8) -> f64 {
    midi_to_frequency(midi as i32, 440.0)
}

/// Parse a note name (e.g. "C4", "F#3", "Bb5", "DB3") into a MIDI note number.
///
/// Accepts both lowercase and uppercase flat markers so that uppercased
/// sample filenames ("BB2", "DB3") parse the same as written note names.
/// Trailing text after the octave digit is ignored.
pub fn note_name_to_midi(note: &str) -> Option<i32> {
    let bytes = note.as_bytes();
    if bytes.is_empty() {
        return None;
    }

    let name = (bytes[0] as char).to_ascii_uppercase();
    let base_semitone = match name {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    let mut idx = 1;
    let mut semitone = base_semitone;

    // Accidental. An uppercase 'B' is only a flat when an octave follows,
    // otherwise "B3" would lose its note letter.
    if idx < bytes.len() {
        match bytes[idx] as char {
            '#' => {
                semitone += 1;
                idx += 1;
            }
            'b' => {
                semitone -= 1;
                idx += 1;
            }
            'B' => {
                let next = bytes.get(idx + 1).map(|&b| b as char);
                if matches!(next, Some('-') | Some('0'..='9')) {
                    semitone -= 1;
                    idx += 1;
                }
            }
            _ => {}
        }
    }

    // Octave number: optional sign plus digits, anything after is ignored.
    let rest = &note[idx..];
    let mut end = 0;
    for (i, ch) in rest.char_indices() {
        if i == 0 && ch == '-' {
            end = 1;
            continue;
        }
        if ch.is_ascii_digit() {
            end = i + 1;
        } else {
            break;
        }
    }
    let octave: i32 = rest[..end].parse().ok()?;

    // MIDI note number: C4 = 60
    Some((octave + 1) * 12 + semitone)
}

/// Group notes by track index, preserving input order within each track.
pub fn group_by_track(notes: &[NoteEvent]) -> BTreeMap<usize, Vec<NoteEvent>> {
    let mut tracks: BTreeMap<usize, Vec<NoteEvent>> = BTreeMap::new();
    for note in notes {
        tracks.entry(note.track).or_default().push(*note);
    }
    tracks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midi_to_freq_a4() {
        assert!((midi_to_freq(69) - 440.0).abs() < 0.001);
    }

    #[test]
    fn midi_to_freq_c4() {
        assert!(
            (midi_to_freq(60) - 261.626).abs() < 0.01,
            "C4 should be ~261.63Hz, got {}",
            midi_to_freq(60)
        );
    }

    #[test]
    fn midi_to_frequency_alternate_tuning() {
        assert!((midi_to_frequency(69, 432.0) - 432.0).abs() < 0.001);
        let c4 = midi_to_frequency(60, 432.0);
        let expected = 432.0 * (2.0_f64).powf((60.0 - 69.0) / 12.0);
        assert!((c4 - expected).abs() < 0.001);
    }

    #[test]
    fn note_name_basic() {
        assert_eq!(note_name_to_midi("A4"), Some(69));
        assert_eq!(note_name_to_midi("C4"), Some(60));
        assert_eq!(note_name_to_midi("C0"), Some(12));
        assert_eq!(note_name_to_midi("C-1"), Some(0));
    }

    #[test]
    fn note_name_accidentals() {
        assert_eq!(note_name_to_midi("F#4"), note_name_to_midi("Gb4"));
        // Uppercase flat, as in uppercased sample filenames.
        assert_eq!(note_name_to_midi("BB2"), note_name_to_midi("A#2"));
        assert_eq!(note_name_to_midi("DB3"), note_name_to_midi("C#3"));
        // A plain B note is not a flat marker.
        assert_eq!(note_name_to_midi("B3"), Some(59));
    }

    #[test]
    fn note_name_ignores_trailing_text() {
        assert_eq!(note_name_to_midi("A4_VH"), Some(69));
        assert_eq!(note_name_to_midi("C#3-take2"), note_name_to_midi("C#3"));
    }

    #[test]
    fn note_name_rejects_garbage() {
        assert_eq!(note_name_to_midi(""), None);
        assert_eq!(note_name_to_midi("H4"), None);
        assert_eq!(note_name_to_midi("C"), None);
    }

    #[test]
    fn groups_by_track() {
        let notes = vec![
            NoteEvent::new(1, 0.0, 0.5, 60, 100),
            NoteEvent::new(0, 0.0, 0.5, 64, 100),
            NoteEvent::new(1, 0.5, 0.5, 62, 90),
        ];
        let grouped = group_by_track(&notes);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[&0].len(), 1);
        assert_eq!(grouped[&1].len(), 2);
        assert_eq!(grouped[&1][0].pitch, 60);
        assert_eq!(grouped[&1][1].pitch, 62);
    }
}
