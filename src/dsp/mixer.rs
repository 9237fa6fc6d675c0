//! Mixer — cross-track summation, normalization, and hard clipping.

/// Sum tracks sample-by-sample into one buffer.
///
/// Shorter tracks are implicitly zero-padded. With `normalize` set, the
/// sum is scaled so its peak sits at `ceiling_dbfs` (e.g. -1.0 dBFS);
/// the peak divisor carries an epsilon floor so silent sums stay silent.
/// The result is hard-clipped to [-1, 1] either way. An empty track list
/// yields a one-sample silent buffer.
pub fn mix_tracks(tracks: &[Vec<f64>], normalize: bool, ceiling_dbfs: f64) -> Vec<f64> {
    let total = tracks.iter().map(|t| t.len()).max().unwrap_or(0);
    if total == 0 {
        return vec![0.0];
    }

    let mut out = vec![0.0_f64; total];
    for track in tracks {
        for (dst, &src) in out.iter_mut().zip(track.iter()) {
            *dst += src;
        }
    }

    if normalize {
        let peak = out.iter().fold(0.0_f64, |m, &s| m.max(s.abs())) + 1e-9;
        let target = 10.0_f64.powf(ceiling_dbfs / 20.0);
        for s in out.iter_mut() {
            *s = *s / peak * target;
        }
    }

    for s in out.iter_mut() {
        *s = s.clamp(-1.0, 1.0);
    }
    out
}
