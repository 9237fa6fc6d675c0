//! Timeline composition — placing rendered notes on a track buffer.

use rayon::prelude::*;

use crate::error::RenderError;
use crate::note::NoteEvent;

/// Render every note independently and overlay each at its start offset.
///
/// The output buffer is sized exactly to the latest note end (rounded up);
/// a rendered buffer that runs past the end is clipped. Overlapping notes
/// sum by plain addition. Note renders run in parallel; the overlay is a
/// single sequential pass.
///
/// A note whose render fails is skipped and reported through `log::warn!`;
/// the error is only propagated when every note failed. An empty note list
/// yields an empty buffer.
pub fn compose_track<F>(
    notes: &[NoteEvent],
    sample_rate: u32,
    render: F,
) -> Result<Vec<f64>, RenderError>
where
    F: Fn(u8, f64, u8, u32) -> Result<Vec<f64>, RenderError> + Sync,
{
    if notes.is_empty() {
        return Ok(Vec::new());
    }

    let sr = sample_rate as f64;
    let t_end = notes.iter().map(|n| n.end()).fold(0.0_f64, f64::max);
    let total = (t_end * sr).ceil() as usize;
    let mut out = vec![0.0_f64; total];

    let rendered: Vec<Result<Vec<f64>, RenderError>> = notes
        .par_iter()
        .map(|note| render(note.pitch, note.duration, note.velocity, sample_rate))
        .collect();

    let mut first_error = None;
    let mut failures = 0;
    for (idx, (note, result)) in notes.iter().zip(rendered).enumerate() {
        let sig = match result {
            Ok(sig) => sig,
            Err(e) => {
                log::warn!(
                    "skipping note {idx} (pitch {}, start {:.3}s): {e}",
                    note.pitch,
                    note.start
                );
                if first_error.is_none() {
                    first_error = Some(e);
                }
                failures += 1;
                continue;
            }
        };
        if note.start < 0.0 {
            log::warn!("skipping note {idx}: negative start time {}", note.start);
            continue;
        }
        let i0 = (note.start * sr) as usize;
        if i0 >= total {
            continue;
        }
        let span = sig.len().min(total - i0);
        for (dst, src) in out[i0..i0 + span].iter_mut().zip(&sig) {
            *dst += src;
        }
    }

    match first_error {
        Some(e) if failures == notes.len() => Err(e),
        _ => Ok(out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Renderer returning a constant 1.0 buffer of the requested duration.
    fn unit_renderer(
        _pitch: u8,
        duration: f64,
        _velocity: u8,
        sample_rate: u32,
    ) -> Result<Vec<f64>, RenderError> {
        Ok(vec![1.0; (duration * sample_rate as f64) as usize])
    }

    #[test]
    fn empty_note_list_gives_empty_buffer() {
        let out = compose_track(&[], 48000, unit_renderer).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn overlapping_notes_sum() {
        let sr = 48000;
        let notes = vec![
            NoteEvent::new(0, 0.0, 0.1, 60, 100),
            NoteEvent::new(0, 0.05, 0.1, 62, 100),
        ];
        let out = compose_track(&notes, sr, unit_renderer).unwrap();
        assert!(out.len() >= (0.15 * sr as f64) as usize);

        // Overlap region carries both notes.
        let mid = (0.075 * sr as f64) as usize;
        assert!((out[mid] - 2.0).abs() < 1e-12, "overlap sample: {}", out[mid]);
        // Head and tail carry one.
        let head = (0.02 * sr as f64) as usize;
        let tail = (0.12 * sr as f64) as usize;
        assert!((out[head] - 1.0).abs() < 1e-12);
        assert!((out[tail] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn buffer_sized_to_latest_end() {
        let sr = 1000;
        let notes = vec![
            NoteEvent::new(0, 0.0, 0.2, 60, 100),
            NoteEvent::new(0, 1.0, 0.5, 64, 100),
        ];
        let out = compose_track(&notes, sr, unit_renderer).unwrap();
        assert_eq!(out.len(), 1500);
    }

    #[test]
    fn renders_longer_than_their_slot_are_clipped() {
        let sr = 1000;
        // Renderer emits double the requested duration.
        let long = |_p: u8, d: f64, _v: u8, s: u32| -> Result<Vec<f64>, RenderError> {
            Ok(vec![1.0; (2.0 * d * s as f64) as usize])
        };
        let notes = vec![NoteEvent::new(0, 0.0, 0.5, 60, 100)];
        let out = compose_track(&notes, sr, long).unwrap();
        // Still sized to the note end, with the tail clipped.
        assert_eq!(out.len(), 500);
        assert!(out.iter().all(|&s| s == 1.0));
    }

    #[test]
    fn failed_note_is_skipped_but_others_render() {
        let sr = 1000;
        let flaky = |p: u8, d: f64, _v: u8, s: u32| -> Result<Vec<f64>, RenderError> {
            if p == 61 {
                Err(RenderError::invalid("pitch", "refusing 61"))
            } else {
                Ok(vec![1.0; (d * s as f64) as usize])
            }
        };
        let notes = vec![
            NoteEvent::new(0, 0.0, 0.1, 60, 100),
            NoteEvent::new(0, 0.2, 0.1, 61, 100),
            NoteEvent::new(0, 0.4, 0.1, 62, 100),
        ];
        let out = compose_track(&notes, sr, flaky).unwrap();
        assert_eq!(out.len(), 500);
        assert_eq!(out[50], 1.0);
        assert_eq!(out[250], 0.0, "failed note leaves silence");
        assert_eq!(out[450], 1.0);
    }

    #[test]
    fn all_notes_failing_propagates_the_error() {
        let broken = |_p: u8, _d: f64, _v: u8, _s: u32| -> Result<Vec<f64>, RenderError> {
            Err(RenderError::invalid("pitch", "always fails"))
        };
        let notes = vec![NoteEvent::new(0, 0.0, 0.1, 60, 100)];
        let err = compose_track(&notes, 1000, broken);
        assert!(matches!(err, Err(RenderError::InvalidParameter { .. })));
    }
}
