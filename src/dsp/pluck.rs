//! Plucked-string synthesis — extended Karplus–Strong.
//!
//! A short feedback delay loop seeded with a pick-shaped excitation,
//! filtered each pass by a loss/averaging stage and a one-pole dispersion
//! stage for string stiffness. Fractional delay-line reads keep the loop
//! tuned between integer lengths; body-resonance IIR presets, a smoothing
//! blend and soft saturation finish the note.

use rand::Rng;

use crate::note::midi_to_freq;
use crate::preset::PluckParams;

use super::delay_line::DelayLine;
use super::filter;
use super::noise;
use super::shape;

/// Seconds of linear fade applied at both buffer edges.
const EDGE_FADE_S: f64 = 0.004;

/// Dispersion coefficients beyond this destabilize the feedback loop.
const MAX_STIFFNESS: f64 = 0.02;

/// Run the raw string loop for `duration` seconds at `f0` Hz.
///
/// Returns a silent buffer of the correct length when `f0 <= 0`. Output is
/// unscaled loop samples; callers apply velocity, body filtering and the
/// finishing chain.
pub fn render_pluck(f0: f64, duration: f64, sample_rate: u32, params: &PluckParams) -> Vec<f64> {
    let total = (sample_rate as f64 * duration) as usize;
    if f0 <= 0.0 {
        return vec![0.0; total];
    }

    // Fractional delay length: integer loop plus interpolated remainder.
    let n_exact = sample_rate as f64 / f0;
    let n_int = n_exact.floor() as usize;
    let frac = n_exact - n_int as f64;
    let len = n_int.max(2);

    let mut rng = noise::rng_from_seed(params.seed);
    let mut line = DelayLine::from_samples(excitation(
        len,
        params.pick_position,
        params.noise_mix,
        &mut rng,
    ));

    let a = params.stiffness.clamp(0.0, MAX_STIFFNESS);
    let rho = params.rho;

    let mut out = vec![0.0_f64; total];
    for y in out.iter_mut() {
        *y = line.current();

        // Fractional read one-and-a-bit steps behind keeps the loop in tune.
        let interp = line.read_fractional(1.0 + frac);
        // Dispersion: (1 + a z^-1) / (1 - a z^-1) style stage.
        let disp = (1.0 + a) * interp - a * line.tap(1);
        // Averaging + loss sets the decay and harmonic rolloff.
        let fed_back = rho * 0.5 * (line.current() + disp);
        line.set_current(fed_back);
        line.advance();
    }

    out
}

/// Render a complete plucked note for a MIDI pitch.
pub fn render_note_pluck(
    pitch: u8,
    duration: f64,
    velocity: u8,
    sample_rate: u32,
    params: &PluckParams,
) -> Vec<f64> {
    let f0 = midi_to_freq(pitch);
    let mut y = render_pluck(f0, duration, sample_rate, params);

    for s in y.iter_mut() {
        *s *= velocity as f64 / 127.0;
    }

    if let Some((b, a)) = params.body.coefficients() {
        y = filter::iir(b, a, &y);
    }

    let smooth = params.smoothing.clamp(0.0, 0.999);
    if smooth > 0.0 {
        y = filter::one_pole_lowpass(&y, 1.0 - smooth);
    }

    let fade = ((EDGE_FADE_S * sample_rate as f64) as usize).max(1);
    shape::fade_edges(&mut y, fade);

    // Gentle saturation before the final normalize.
    for s in y.iter_mut() {
        *s = (1.2 * *s).tanh();
    }
    shape::normalize_peak(&mut y);

    y
}

/// Build the excitation buffer: a bipolar ramp minus a circularly shifted
/// copy of itself (the pick-position comb null), optional Gaussian noise,
/// normalized to unit peak.
fn excitation<R: Rng>(len: usize, pick_position: f64, noise_mix: f64, rng: &mut R) -> Vec<f64> {
    let mut buf: Vec<f64> = (0..len)
        .map(|i| 1.0 - 2.0 * i as f64 / (len - 1) as f64)
        .collect();

    let shift = ((pick_position * len as f64).round() as i64).clamp(1, len as i64 - 1) as usize;
    let ramp = buf.clone();
    for i in 0..len {
        buf[i] -= ramp[(i + len - shift) % len];
    }

    if noise_mix > 0.0 {
        for s in buf.iter_mut() {
            *s += noise_mix * noise::gaussian(rng);
        }
    }

    shape::normalize_peak(&mut buf);
    buf
}
