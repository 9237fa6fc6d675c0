//! ADSR envelope generator.

use serde::{Deserialize, Serialize};

/// Attack/decay/sustain/release envelope settings. Times in milliseconds,
/// sustain as a level in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdsrParams {
    pub attack_ms: f64,
    pub decay_ms: f64,
    pub sustain: f64,
    pub release_ms: f64,
}

impl Default for AdsrParams {
    fn default() -> Self {
        AdsrParams {
            attack_ms: 10.0,
            decay_ms: 60.0,
            sustain: 0.6,
            release_ms: 120.0,
        }
    }
}

impl AdsrParams {
    /// Build the gain curve for a note of `duration` seconds.
    ///
    /// Linear attack to 1.0, linear decay to the sustain level, sustain hold
    /// sized to whatever remains, linear release to 0.0. The curve is always
    /// exactly `duration * sample_rate` samples: a too-long A+D+R chain is
    /// truncated, a too-short one is padded with zeros after the release.
    pub fn curve(&self, sample_rate: u32, duration: f64) -> Vec<f64> {
        let sr = sample_rate as f64;
        let total = (sr * duration) as usize;
        let attack = (sr * self.attack_ms / 1000.0) as usize;
        let decay = (sr * self.decay_ms / 1000.0) as usize;
        let release = (sr * self.release_ms / 1000.0) as usize;
        let hold = total.saturating_sub(attack + decay + release);

        if attack + decay + release + hold == 0 {
            return vec![1.0; total];
        }

        let mut env = Vec::with_capacity(total);
        for i in 0..attack {
            env.push(i as f64 / attack as f64);
        }
        for i in 0..decay {
            env.push(1.0 - (1.0 - self.sustain) * i as f64 / decay as f64);
        }
        for _ in 0..hold {
            env.push(self.sustain);
        }
        if release == 1 {
            env.push(self.sustain);
        } else {
            for i in 0..release {
                env.push(self.sustain * (1.0 - i as f64 / (release - 1) as f64));
            }
        }

        env.resize(total, 0.0);
        env
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curve_has_exact_length() {
        let adsr = AdsrParams::default();
        for &dur in &[0.05, 0.1, 1.0, 2.3] {
            let env = adsr.curve(48000, dur);
            assert_eq!(env.len(), (48000.0 * dur) as usize);
        }
    }

    #[test]
    fn curve_values_in_unit_range() {
        let adsr = AdsrParams::default();
        let env = adsr.curve(48000, 1.0);
        for (i, &v) in env.iter().enumerate() {
            assert!(
                (0.0..=1.0).contains(&v),
                "envelope out of range at sample {i}: {v}"
            );
        }
    }

    #[test]
    fn attack_rises_to_peak() {
        let adsr = AdsrParams {
            attack_ms: 100.0,
            decay_ms: 0.0,
            sustain: 1.0,
            release_ms: 0.0,
        };
        let env = adsr.curve(1000, 1.0);
        assert!(env[0] < 0.02);
        // End of the 100-sample attack should be at (or just under) peak.
        assert!((env[100] - 1.0).abs() < 0.02, "got {}", env[100]);
    }

    #[test]
    fn sustain_holds_between_decay_and_release() {
        let adsr = AdsrParams {
            attack_ms: 10.0,
            decay_ms: 10.0,
            sustain: 0.6,
            release_ms: 10.0,
        };
        let env = adsr.curve(1000, 1.0);
        // Well inside the hold region.
        assert!((env[500] - 0.6).abs() < 1e-9, "got {}", env[500]);
    }

    #[test]
    fn release_ends_at_zero() {
        let adsr = AdsrParams::default();
        let env = adsr.curve(48000, 1.0);
        assert!(env[env.len() - 1].abs() < 1e-9);
    }

    #[test]
    fn short_note_truncates_chain() {
        // A + D + R = 190ms but the note is 50ms long.
        let adsr = AdsrParams::default();
        let env = adsr.curve(1000, 0.05);
        assert_eq!(env.len(), 50);
        // Attack completes, then the decay is cut off mid-ramp.
        assert!(env[49] <= 1.0 && env[1] > 0.0);
    }

    #[test]
    fn zero_ramps_hold_sustain_level() {
        let adsr = AdsrParams {
            attack_ms: 0.0,
            decay_ms: 0.0,
            sustain: 0.6,
            release_ms: 0.0,
        };
        let env = adsr.curve(1000, 0.01);
        assert_eq!(env.len(), 10);
        assert!(env.iter().all(|&v| (v - 0.6).abs() < 1e-12));
    }
}
