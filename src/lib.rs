//! Camerata core — offline note-event music rendering.
//!
//! Takes note events (track, start, duration, pitch, velocity) from an
//! external source, renders each through a synthesis engine (plucked
//! string, additive partial bank, or sample playback), places the rendered
//! buffers on per-track timelines, mixes tracks to a normalized mono
//! buffer, and optionally runs send effects (delay, flanger, reverb).
//! Everything is buffer-at-a-time and stateless between calls, so note and
//! track renders parallelize freely.

pub mod dsp;
pub mod error;
pub mod io;
pub mod note;
pub mod preset;
pub mod render;

pub use error::RenderError;
pub use note::NoteEvent;
pub use render::{
    Effect, Instrument, RenderSettings, Track, apply_effect_chain, render_tracks, render_wav,
};

pub use dsp::mixer::mix_tracks;
pub use dsp::timeline::compose_track;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Render one note through an engine. See [`Instrument::render_note`].
pub fn render_note(
    instrument: &Instrument,
    pitch: u8,
    duration: f64,
    velocity: u8,
    sample_rate: u32,
) -> Result<Vec<f64>, RenderError> {
    instrument.render_note(pitch, duration, velocity, sample_rate)
}

/// Apply one effect to a signal. See [`Effect::apply`].
pub fn apply_effect(
    effect: &Effect,
    signal: &[f64],
    sample_rate: u32,
) -> Result<Vec<f64>, RenderError> {
    effect.apply(signal, sample_rate)
}
