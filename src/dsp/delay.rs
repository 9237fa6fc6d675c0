//! Feedback delay send.

use crate::error::RenderError;
use crate::preset::DelayParams;

use super::delay_line::DelayLine;

/// Apply a feedback delay: `wet[n] = x[n] + feedback * wet[n - d]`.
///
/// The output is the dry/wet blend at the input's length. Feedback at or
/// beyond unit magnitude would grow without bound, so it fails fast
/// instead of being clamped.
pub fn delay(
    signal: &[f64],
    sample_rate: u32,
    params: &DelayParams,
) -> Result<Vec<f64>, RenderError> {
    if params.feedback.abs() >= 1.0 {
        return Err(RenderError::invalid(
            "feedback",
            format!("{} is unstable; |feedback| must be < 1", params.feedback),
        ));
    }
    let mix = params.mix.clamp(0.0, 1.0);
    let d = ((sample_rate as f64 * params.time_ms / 1000.0).round() as usize).max(1);

    // The line holds the last `d` wet samples; `current` is wet[n - d].
    let mut line = DelayLine::new(d);
    let mut out = Vec::with_capacity(signal.len());
    for &x in signal {
        let wet = x + params.feedback * line.current();
        line.set_current(wet);
        line.advance();
        out.push((1.0 - mix) * x + mix * wet);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_feedback_is_identity_at_mix_extremes() {
        let signal: Vec<f64> = (0..500).map(|i| ((i * 7) % 13) as f64 / 13.0 - 0.5).collect();
        for mix in [0.0, 1.0] {
            let params = DelayParams {
                time_ms: 10.0,
                feedback: 0.0,
                mix,
            };
            let out = delay(&signal, 48000, &params).unwrap();
            for (i, (a, b)) in signal.iter().zip(&out).enumerate() {
                assert!((a - b).abs() < 1e-12, "mix {mix}, sample {i}: {a} vs {b}");
            }
        }
    }

    #[test]
    fn impulse_echoes_at_delay_multiples() {
        let sr = 1000;
        let mut signal = vec![0.0; 100];
        signal[0] = 1.0;
        let params = DelayParams {
            time_ms: 10.0, // 10 samples at 1 kHz
            feedback: 0.5,
            mix: 1.0,
        };
        let out = delay(&signal, sr, &params).unwrap();
        assert!((out[0] - 1.0).abs() < 1e-12);
        assert!((out[10] - 0.5).abs() < 1e-12);
        assert!((out[20] - 0.25).abs() < 1e-12);
        // Nothing between echoes.
        assert!(out[5].abs() < 1e-12 && out[15].abs() < 1e-12);
    }

    #[test]
    fn output_length_matches_input() {
        let signal = vec![0.25; 4321];
        let out = delay(&signal, 44100, &DelayParams::default()).unwrap();
        assert_eq!(out.len(), signal.len());
    }

    #[test]
    fn unstable_feedback_is_rejected() {
        let signal = vec![0.0; 16];
        for fb in [1.0, -1.0, 1.5] {
            let params = DelayParams {
                feedback: fb,
                ..Default::default()
            };
            let err = delay(&signal, 48000, &params);
            assert!(
                matches!(err, Err(RenderError::InvalidParameter { .. })),
                "feedback {fb} should be rejected"
            );
        }
    }
}
