//! Convolution reverb with a synthetic exponential impulse response.
//!
//! The IR is rebuilt on every call (the effect is stateless): an
//! exponential tail whose length scales with room size and whose
//! per-sample decay hits the requested T60, normalized to unit energy
//! sum. Convolution runs through an FFT for longer tails and directly for
//! short ones; both paths agree to floating-point tolerance.

use std::f64::consts::PI;

use rustfft::{FftPlanner, num_complex::Complex};

use crate::preset::ReverbParams;

use super::filter;

/// IRs shorter than this convolve faster directly than via FFT.
const FFT_THRESHOLD: usize = 64;

/// Natural log of 10^3 — a 60 dB amplitude drop.
const T60_LN: f64 = 6.9077554;

/// Apply the reverb to a signal, returning a buffer of the same length.
pub fn reverb(signal: &[f64], sample_rate: u32, params: &ReverbParams) -> Vec<f64> {
    let sr = sample_rate as f64;
    let n = signal.len();
    if n == 0 {
        return Vec::new();
    }

    let ir = build_ir(params, sample_rate);
    let mut wet = convolve(signal, &ir);
    wet.truncate(n);
    wet.resize(n, 0.0);

    // Pre-delay shifts the wet tail back without lengthening the buffer.
    let pre = (params.pre_delay_ms.max(0.0) * 1e-3 * sr).round() as usize;
    if pre > 0 {
        if pre >= n {
            wet.iter_mut().for_each(|s| *s = 0.0);
        } else {
            wet.rotate_right(pre);
            wet[..pre].iter_mut().for_each(|s| *s = 0.0);
        }
    }

    // Brightness controls the tail's low-pass cutoff.
    let fc = 1000.0 + 9000.0 * params.brightness.clamp(0.0, 1.0);
    let alpha = (2.0 * PI * fc) / (2.0 * PI * fc + sr);
    let wet = filter::one_pole_lowpass(&wet, alpha);

    let mix = params.mix.clamp(0.0, 1.0);
    signal
        .iter()
        .zip(wet.iter())
        .map(|(&dry, &w)| (1.0 - mix) * dry + mix * w)
        .collect()
}

/// Build the exponential impulse response for the given parameters.
///
/// A T60 at or below 50 ms degenerates to a unit impulse.
pub fn build_ir(params: &ReverbParams, sample_rate: u32) -> Vec<f64> {
    let sr = sample_rate as f64;
    let len = ((params.room_size * 0.06 * sr) as usize).max(1);

    if params.decay_s <= 0.05 {
        return vec![1.0];
    }

    let mut ir: Vec<f64> = (0..len)
        .map(|t| (-T60_LN * t as f64 / (params.decay_s * sr)).exp())
        .collect();
    let sum: f64 = ir.iter().sum();
    if sum > 0.0 {
        for s in ir.iter_mut() {
            *s /= sum + 1e-12;
        }
    }
    ir
}

/// Full linear convolution, FFT-backed when the kernel is long enough.
fn convolve(x: &[f64], h: &[f64]) -> Vec<f64> {
    if h.len() < FFT_THRESHOLD {
        convolve_direct(x, h)
    } else {
        convolve_fft(x, h)
    }
}

fn convolve_direct(x: &[f64], h: &[f64]) -> Vec<f64> {
    let n = x.len() + h.len() - 1;
    let mut out = vec![0.0_f64; n];
    for (i, &xi) in x.iter().enumerate() {
        if xi == 0.0 {
            continue;
        }
        for (j, &hj) in h.iter().enumerate() {
            out[i + j] += xi * hj;
        }
    }
    out
}

fn convolve_fft(x: &[f64], h: &[f64]) -> Vec<f64> {
    let n = x.len() + h.len() - 1;
    let size = n.next_power_of_two();

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(size);
    let ifft = planner.plan_fft_inverse(size);

    let mut a: Vec<Complex<f64>> = x
        .iter()
        .map(|&v| Complex::new(v, 0.0))
        .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
        .take(size)
        .collect();
    let mut b: Vec<Complex<f64>> = h
        .iter()
        .map(|&v| Complex::new(v, 0.0))
        .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
        .take(size)
        .collect();

    fft.process(&mut a);
    fft.process(&mut b);
    for (av, bv) in a.iter_mut().zip(b.iter()) {
        *av *= *bv;
    }
    ifft.process(&mut a);

    let scale = 1.0 / size as f64;
    a[..n].iter().map(|c| c.re * scale).collect()
}
