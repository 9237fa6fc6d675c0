//! Shared buffer shaping: anti-click edge fades and peak normalization.
//!
//! Every engine finishes with the same post-processing contract so that
//! rendered notes mix uniformly downstream.

/// Apply linear fade-in and fade-out ramps of `fade_samples` samples.
///
/// The fade length is clamped to the buffer length; buffers shorter than
/// two samples are left untouched.
pub fn fade_edges(buf: &mut [f64], fade_samples: usize) {
    let n = buf.len();
    if n < 2 {
        return;
    }
    let fade = fade_samples.max(1).min(n);
    for i in 0..fade {
        let g = i as f64 / fade as f64;
        buf[i] *= g;
        buf[n - 1 - i] *= g;
    }
}

/// Scale the buffer so its absolute peak is 1.0.
///
/// The divisor carries an epsilon floor, so silent buffers stay silent
/// instead of dividing by zero.
pub fn normalize_peak(buf: &mut [f64]) {
    let peak = peak(buf) + 1e-9;
    for s in buf.iter_mut() {
        *s /= peak;
    }
}

/// Absolute peak value of the buffer.
pub fn peak(buf: &[f64]) -> f64 {
    buf.iter().fold(0.0_f64, |m, &s| m.max(s.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fades_start_and_end_at_zero() {
        let mut buf = vec![1.0; 100];
        fade_edges(&mut buf, 10);
        assert_eq!(buf[0], 0.0);
        assert_eq!(buf[99], 0.0);
        assert!(buf[5] > 0.0 && buf[5] < 1.0);
        // Middle untouched.
        assert_eq!(buf[50], 1.0);
    }

    #[test]
    fn fade_longer_than_buffer_is_clamped() {
        let mut buf = vec![1.0; 4];
        fade_edges(&mut buf, 100);
        assert!(buf.iter().all(|&s| (0.0..=1.0).contains(&s)));
    }

    #[test]
    fn normalize_reaches_unit_peak() {
        let mut buf = vec![0.0, 0.25, -0.5, 0.1];
        normalize_peak(&mut buf);
        assert!((peak(&buf) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn normalize_of_silence_stays_silent() {
        let mut buf = vec![0.0; 64];
        normalize_peak(&mut buf);
        assert!(buf.iter().all(|&s| s == 0.0 && s.is_finite()));
    }
}
