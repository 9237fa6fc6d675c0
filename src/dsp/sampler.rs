//! Sample-based playback.
//!
//! A `SampleBank` maps MIDI pitches to recorded layers; rendering picks
//! the nearest recorded pitch, chooses a velocity layer, resamples to the
//! target pitch and rate, and applies the common finishing chain.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::RenderError;
use crate::note::note_name_to_midi;
use crate::preset::SampleParams;

use super::shape;

/// Seconds of linear fade applied at both buffer edges.
const EDGE_FADE_S: f64 = 0.003;

/// Velocity layer tag, parsed from recording filenames
/// (`..VH..` = high, `..VL..` = low, anything else = medium).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VelocityTag {
    Low,
    Medium,
    High,
}

/// One recording: its layer tag, mono samples, and native sample rate.
#[derive(Debug, Clone)]
pub struct SampleEntry {
    pub tag: VelocityTag,
    pub data: Vec<f64>,
    pub sample_rate: u32,
}

/// A pitch-indexed bank of recordings.
///
/// Backed by a `BTreeMap` so iteration is in ascending pitch order, which
/// makes nearest-pitch ties resolve deterministically toward the lower
/// pitch.
#[derive(Debug, Clone, Default)]
pub struct SampleBank {
    notes: BTreeMap<u8, Vec<SampleEntry>>,
}

impl SampleBank {
    pub fn new() -> Self {
        SampleBank::default()
    }

    /// Add a recording under a MIDI pitch.
    pub fn insert(&mut self, pitch: u8, entry: SampleEntry) {
        self.notes.entry(pitch).or_default().push(entry);
    }

    /// Number of distinct pitches in the bank.
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Load every parseable `.wav` in a folder.
    ///
    /// The MIDI pitch comes from the filename stem ("A4.wav", "C#3_VH.wav",
    /// "DB2_VL.wav"); files whose stem does not start with a note name are
    /// skipped. Multichannel recordings are averaged down to mono. An
    /// absent or sample-less folder is a `MissingResource` error.
    pub fn from_dir(folder: &Path) -> Result<Self, RenderError> {
        if !folder.is_dir() {
            return Err(RenderError::MissingResource {
                what: format!("sample folder {}", folder.display()),
            });
        }

        let mut bank = SampleBank::new();
        let entries = std::fs::read_dir(folder).map_err(|e| RenderError::MissingResource {
            what: format!("sample folder {}: {e}", folder.display()),
        })?;
        for entry in entries.flatten() {
            let path = entry.path();
            let is_wav = path
                .extension()
                .map(|e| e.eq_ignore_ascii_case("wav"))
                .unwrap_or(false);
            if !is_wav {
                continue;
            }
            let stem = match path.file_stem().and_then(|s| s.to_str()) {
                Some(s) => s.to_ascii_uppercase(),
                None => continue,
            };
            let midi = match note_name_to_midi(&stem) {
                Some(m) if (0..=127).contains(&m) => m as u8,
                _ => continue,
            };
            let tag = if stem.contains("VH") {
                VelocityTag::High
            } else if stem.contains("VL") {
                VelocityTag::Low
            } else {
                VelocityTag::Medium
            };

            let (data, sample_rate) = crate::io::read_wav(&path)?;
            bank.insert(
                midi,
                SampleEntry {
                    tag,
                    data,
                    sample_rate,
                },
            );
        }

        if bank.is_empty() {
            return Err(RenderError::MissingResource {
                what: format!("no usable .wav recordings in {}", folder.display()),
            });
        }
        log::info!(
            "loaded {} pitches from {}",
            bank.len(),
            folder.display()
        );
        Ok(bank)
    }

    /// The recorded pitch nearest to `pitch`; ties prefer the lower pitch.
    pub fn nearest_pitch(&self, pitch: u8) -> Option<u8> {
        let mut best: Option<(u8, i32)> = None;
        for &k in self.notes.keys() {
            let dist = (k as i32 - pitch as i32).abs();
            if best.map(|(_, d)| dist < d).unwrap_or(true) {
                best = Some((k, dist));
            }
        }
        best.map(|(k, _)| k)
    }

    /// Pick a layer: `High` when velocity > 90 else `Low`, falling back to
    /// `Medium`, then the first recording for that pitch.
    fn select_layer(&self, pitch: u8, velocity: u8) -> Option<&SampleEntry> {
        let layers = self.notes.get(&pitch)?;
        let preferred = if velocity > 90 {
            VelocityTag::High
        } else {
            VelocityTag::Low
        };
        layers
            .iter()
            .find(|e| e.tag == preferred)
            .or_else(|| layers.iter().find(|e| e.tag == VelocityTag::Medium))
            .or_else(|| layers.first())
    }
}

/// Render a note by pitch-shifting the nearest recording.
pub fn render_sample(
    bank: &SampleBank,
    pitch: u8,
    duration: f64,
    velocity: u8,
    sample_rate: u32,
    params: &SampleParams,
) -> Result<Vec<f64>, RenderError> {
    let base = bank.nearest_pitch(pitch).ok_or(RenderError::MissingResource {
        what: "sample bank is empty".to_string(),
    })?;
    let entry = bank
        .select_layer(base, velocity)
        .expect("nearest pitch always has at least one layer");

    // Playback rate: pitch shift times the native/output rate ratio.
    let ratio = (2.0_f64).powf((pitch as f64 - base as f64) / 12.0)
        * entry.sample_rate as f64
        / sample_rate as f64;
    let new_len = ((entry.data.len() as f64 / ratio) as usize).max(1);
    let mut y = resample_linear(&entry.data, new_len);
    shape::normalize_peak(&mut y);

    let total = (duration * sample_rate as f64) as usize;
    y.resize(total, 0.0);

    let env = params.adsr.curve(sample_rate, duration);
    for (s, e) in y.iter_mut().zip(env.iter()) {
        *s *= e * velocity as f64 / 127.0;
    }

    let fade = ((EDGE_FADE_S * sample_rate as f64) as usize).max(1);
    shape::fade_edges(&mut y, fade);
    shape::normalize_peak(&mut y);

    Ok(y)
}

/// Linearly resample a buffer to a new length over the same span.
fn resample_linear(data: &[f64], new_len: usize) -> Vec<f64> {
    if new_len == 0 {
        return vec![0.0];
    }
    if data.len() == new_len {
        return data.to_vec();
    }
    if data.len() < 2 {
        return vec![data.first().copied().unwrap_or(0.0); new_len];
    }

    let src_max = (data.len() - 1) as f64;
    (0..new_len)
        .map(|i| {
            let pos = if new_len > 1 {
                i as f64 / (new_len - 1) as f64 * src_max
            } else {
                0.0
            };
            let idx = pos as usize;
            if idx >= data.len() - 1 {
                data[data.len() - 1]
            } else {
                let frac = pos - idx as f64;
                data[idx] * (1.0 - frac) + data[idx + 1] * frac
            }
        })
        .collect()
}
