//! Flanger — LFO-modulated delay with feedback and fractional reads.

use std::f64::consts::PI;

use crate::preset::FlangerParams;

use super::delay_line::DelayLine;

/// Apply a flanger: a sinusoidally modulated short delay blended with the
/// dry signal. Feedback enters at the delay-line write stage; the read
/// position is fractional, interpolated between neighboring cells.
pub fn flanger(signal: &[f64], sample_rate: u32, params: &FlangerParams) -> Vec<f64> {
    let sr = sample_rate as f64;
    let fb = params.feedback.clamp(-0.95, 0.95);
    let mix = params.mix.clamp(0.0, 1.0);

    let max_delay_ms = params.base_ms + params.depth_ms;
    let capacity = (max_delay_ms * 1e-3 * sr).ceil() as usize + 2;
    let mut line = DelayLine::new(capacity);

    let mut out = Vec::with_capacity(signal.len());
    for (n, &x) in signal.iter().enumerate() {
        let t = n as f64 / sr;
        let lfo = (2.0 * PI * params.rate_hz * t).sin();
        let delay_samples = (params.base_ms + params.depth_ms * 0.5 * (lfo + 1.0)) * 1e-3 * sr;

        // Feedback lands at the write head before the read.
        line.set_current(x + fb * line.current());
        let delayed = line.read_fractional(delay_samples);
        out.push((1.0 - mix) * x + mix * delayed);
        line.advance();
    }
    out
}
