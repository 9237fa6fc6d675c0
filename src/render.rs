//! Rendering pipeline — engine dispatch, per-track composition, effect
//! sends, and the final mix.
//!
//! Engine and effect selection are closed enums resolved once when a
//! session is assembled; the hot paths never branch on strings.

use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::dsp::sampler::SampleBank;
use crate::dsp::{additive, delay, flanger, mixer, pluck, reverb, sampler, timeline};
use crate::error::RenderError;
use crate::note::NoteEvent;
use crate::preset::{
    AdditiveParams, DelayParams, FlangerParams, PluckParams, ReverbParams, SampleParams,
};

/// A synthesis engine with its parameters, ready to render notes.
#[derive(Debug, Clone)]
pub enum Instrument {
    /// Karplus–Strong plucked string.
    Pluck(PluckParams),
    /// Additive partial bank.
    Additive(AdditiveParams),
    /// Pitched playback of recorded samples.
    Sample {
        bank: Arc<SampleBank>,
        params: SampleParams,
    },
}

impl Instrument {
    /// Render one note to a mono buffer of `duration * sample_rate` samples.
    ///
    /// Fails fast on out-of-range pitch/velocity, non-positive duration, or
    /// a zero sample rate.
    pub fn render_note(
        &self,
        pitch: u8,
        duration: f64,
        velocity: u8,
        sample_rate: u32,
    ) -> Result<Vec<f64>, RenderError> {
        if pitch > 127 {
            return Err(RenderError::invalid(
                "pitch",
                format!("{pitch} is outside the MIDI range 0-127"),
            ));
        }
        if velocity > 127 {
            return Err(RenderError::invalid(
                "velocity",
                format!("{velocity} is outside the MIDI range 0-127"),
            ));
        }
        if !(duration > 0.0) {
            return Err(RenderError::invalid(
                "duration",
                format!("{duration} is not a positive length in seconds"),
            ));
        }
        if sample_rate == 0 {
            return Err(RenderError::invalid("sample_rate", "must be positive"));
        }

        match self {
            Instrument::Pluck(params) => Ok(pluck::render_note_pluck(
                pitch,
                duration,
                velocity,
                sample_rate,
                params,
            )),
            Instrument::Additive(params) => Ok(additive::render_additive(
                pitch,
                duration,
                velocity,
                sample_rate,
                params,
            )),
            Instrument::Sample { bank, params } => {
                sampler::render_sample(bank, pitch, duration, velocity, sample_rate, params)
            }
        }
    }
}

/// A send effect with its parameters.
///
/// Serialized with a `type` tag so effect chains can live in preset files:
/// `{"type": "reverb", "decay_s": 2.5}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Effect {
    Delay(DelayParams),
    Flanger(FlangerParams),
    Reverb(ReverbParams),
}

impl Effect {
    /// Process a signal, returning a buffer of the same length.
    pub fn apply(&self, signal: &[f64], sample_rate: u32) -> Result<Vec<f64>, RenderError> {
        match self {
            Effect::Delay(params) => delay::delay(signal, sample_rate, params),
            Effect::Flanger(params) => Ok(flanger::flanger(signal, sample_rate, params)),
            Effect::Reverb(params) => Ok(reverb::reverb(signal, sample_rate, params)),
        }
    }
}

/// Run a signal through an ordered effect chain.
pub fn apply_effect_chain(
    effects: &[Effect],
    signal: Vec<f64>,
    sample_rate: u32,
) -> Result<Vec<f64>, RenderError> {
    let mut out = signal;
    for effect in effects {
        out = effect.apply(&out, sample_rate)?;
    }
    Ok(out)
}

/// One track of a session: its notes, engine, and send effects.
#[derive(Debug, Clone)]
pub struct Track {
    pub notes: Vec<NoteEvent>,
    pub instrument: Instrument,
    pub effects: Vec<Effect>,
}

/// Output settings for a session render.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub sample_rate: u32,
    /// Scale the mix so its peak hits `ceiling_dbfs`.
    pub normalize: bool,
    /// Target peak level after normalization, in dBFS.
    pub ceiling_dbfs: f64,
    /// Effects applied to the final mix.
    pub master_effects: Vec<Effect>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings {
            sample_rate: 48000,
            normalize: true,
            ceiling_dbfs: -1.0,
            master_effects: Vec::new(),
        }
    }
}

/// Render a full session: compose each track, run its sends, mix, and run
/// the master chain. Tracks render in parallel.
pub fn render_tracks(
    tracks: &[Track],
    settings: &RenderSettings,
) -> Result<Vec<f64>, RenderError> {
    let sr = settings.sample_rate;
    let rendered: Vec<Result<Vec<f64>, RenderError>> = tracks
        .par_iter()
        .enumerate()
        .map(|(idx, track)| {
            log::debug!("rendering track {idx} ({} notes)", track.notes.len());
            let buf = timeline::compose_track(&track.notes, sr, |pitch, dur, vel, rate| {
                track.instrument.render_note(pitch, dur, vel, rate)
            })?;
            apply_effect_chain(&track.effects, buf, sr)
        })
        .collect();

    let mut buffers = Vec::with_capacity(rendered.len());
    for result in rendered {
        buffers.push(result?);
    }

    let mix = mixer::mix_tracks(&buffers, settings.normalize, settings.ceiling_dbfs);
    apply_effect_chain(&settings.master_effects, mix, sr)
}

/// Render a session straight to an in-memory 16-bit mono WAV.
pub fn render_wav(tracks: &[Track], settings: &RenderSettings) -> Result<Vec<u8>, RenderError> {
    let mix = render_tracks(tracks, settings)?;
    crate::io::encode_wav(&mix, settings.sample_rate)
}
