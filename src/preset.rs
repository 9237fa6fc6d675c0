//! Instrument and effect parameter types.
//!
//! Each render call takes one of these bags by value — there is no shared
//! mutable state between renders. All types carry serde derives so preset
//! banks can be stored as JSON and map directly onto them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::RenderError;

pub use crate::dsp::envelope::AdsrParams;

// ── Plucked string ──────────────────────────────────────────

/// Body resonance presets for the plucked-string engine.
///
/// Each preset is a fixed small-order IIR modeling the instrument body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyPreset {
    #[default]
    None,
    Nylon,
    Steel,
    Bass,
    Banjo,
}

impl BodyPreset {
    /// Numerator/denominator coefficients of the body filter, or `None`
    /// when no body filtering applies.
    pub fn coefficients(&self) -> Option<(&'static [f64], &'static [f64])> {
        match self {
            BodyPreset::None => None,
            BodyPreset::Nylon => Some((
                &[0.005, 0.0, -0.004, 0.0, 0.003],
                &[1.0, -0.95, 0.90, -0.70, 0.50],
            )),
            BodyPreset::Steel => Some((&[0.006, -0.002, 0.0015], &[1.0, -0.92, 0.85])),
            BodyPreset::Bass => Some((&[0.004, 0.0035, 0.002], &[1.0, -0.96, 0.94])),
            BodyPreset::Banjo => Some((&[0.01, -0.004, 0.002], &[1.0, -0.75, 0.60])),
        }
    }
}

/// Parameters for the plucked-string (Karplus–Strong) engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluckParams {
    /// Loop loss coefficient; sets the decay rate. Stable in (0, 1).
    pub rho: f64,
    /// One-pole output smoothing blend in [0, 1]. 0 = no smoothing.
    pub smoothing: f64,
    /// Pluck position along the string in (0, 1).
    pub pick_position: f64,
    /// Gaussian noise mixed into the excitation (0 = deterministic pluck).
    pub noise_mix: f64,
    /// String stiffness (dispersion) coefficient, clamped to [0, 0.02].
    pub stiffness: f64,
    /// Body resonance preset.
    pub body: BodyPreset,
    /// RNG seed for the excitation noise; `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for PluckParams {
    fn default() -> Self {
        PluckParams {
            rho: 0.998,
            smoothing: 0.5,
            pick_position: 0.20,
            noise_mix: 0.02,
            stiffness: 0.0,
            body: BodyPreset::None,
            seed: None,
        }
    }
}

// ── Additive partial bank ───────────────────────────────────

/// Parameters for the additive (piano-like) partial-bank engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdditiveParams {
    /// Number of partials summed (those above Nyquist are skipped).
    pub partials: usize,
    /// Inharmonicity coefficient B in `f_k = k*f0*sqrt(1 + B*k^2)`.
    pub inharmonicity: f64,
    /// Amplitude rolloff exponent: `a_k = 1 / k^amp_decay_exp`.
    pub amp_decay_exp: f64,
    /// Geometric shrink of each partial's decay time constant.
    pub partial_decay_base: f64,
    /// Hammer-noise onset mix (0 = no onset noise).
    pub noise_mix: f64,
    /// Global amplitude envelope.
    pub adsr: AdsrParams,
    /// RNG seed for partial phases and hammer noise; `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for AdditiveParams {
    fn default() -> Self {
        AdditiveParams {
            partials: 30,
            inharmonicity: 3e-4,
            amp_decay_exp: 1.2,
            partial_decay_base: 0.85,
            noise_mix: 0.08,
            adsr: AdsrParams {
                attack_ms: 2.0,
                decay_ms: 900.0,
                sustain: 0.0,
                release_ms: 250.0,
            },
            seed: None,
        }
    }
}

/// Parameters for the additive kick drum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KickParams {
    pub duration: f64,
    /// Starting frequency of the pitch drop, in Hz.
    pub f_start_hz: f64,
    /// Resting frequency of the pitch drop, in Hz.
    pub f_end_hz: f64,
    /// Time constant of the pitch drop, in milliseconds.
    pub tau_freq_ms: f64,
    /// Partial amplitudes.
    pub amps: Vec<f64>,
    /// Partial frequency ratios relative to the dropping fundamental.
    pub ratios: Vec<f64>,
    /// Per-partial amplitude decay time constants, in milliseconds.
    pub tau_amp_ms: Vec<f64>,
    /// Click-noise onset length, in milliseconds (0 disables).
    pub click_ms: f64,
    /// Click-noise mix in [0, 1].
    pub click_mix: f64,
    /// First-order high-pass cutoff in Hz (0 disables).
    pub hp_hz: f64,
    /// Soft-clip drive (0 disables).
    pub drive: f64,
    /// RNG seed for phases and click noise; `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for KickParams {
    fn default() -> Self {
        KickParams {
            duration: 0.35,
            f_start_hz: 140.0,
            f_end_hz: 48.0,
            tau_freq_ms: 24.0,
            amps: vec![1.0, 0.5, 0.25, 0.15, 0.10],
            ratios: vec![1.0, 1.6, 2.3, 3.5, 4.2],
            tau_amp_ms: vec![120.0, 90.0, 70.0, 55.0, 45.0],
            click_ms: 4.0,
            click_mix: 0.06,
            hp_hz: 22.0,
            drive: 0.9,
            seed: None,
        }
    }
}

// ── Sample playback ─────────────────────────────────────────

/// Parameters for the sample playback renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleParams {
    /// Amplitude envelope applied to the resampled recording.
    pub adsr: AdsrParams,
}

impl Default for SampleParams {
    fn default() -> Self {
        SampleParams {
            adsr: AdsrParams {
                attack_ms: 5.0,
                decay_ms: 500.0,
                sustain: 0.4,
                release_ms: 300.0,
            },
        }
    }
}

// ── Effects ─────────────────────────────────────────────────

/// Configuration for the feedback delay effect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayParams {
    /// Delay time in milliseconds.
    pub time_ms: f64,
    /// Feedback amount; must stay below 1.0 in magnitude.
    pub feedback: f64,
    /// Dry/wet mix (0.0 = fully dry, 1.0 = fully wet).
    pub mix: f64,
}

impl Default for DelayParams {
    fn default() -> Self {
        DelayParams {
            time_ms: 220.0,
            feedback: 0.25,
            mix: 0.2,
        }
    }
}

/// Configuration for the flanger effect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlangerParams {
    /// LFO rate in Hz.
    pub rate_hz: f64,
    /// Modulation depth in milliseconds.
    pub depth_ms: f64,
    /// Base delay in milliseconds.
    pub base_ms: f64,
    /// Feedback amount, clamped to [-0.95, 0.95].
    pub feedback: f64,
    /// Dry/wet mix (0.0 = fully dry, 1.0 = fully wet).
    pub mix: f64,
}

impl Default for FlangerParams {
    fn default() -> Self {
        FlangerParams {
            rate_hz: 0.25,
            depth_ms: 3.0,
            base_ms: 2.0,
            feedback: 0.2,
            mix: 0.5,
        }
    }
}

/// Configuration for the convolution reverb effect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReverbParams {
    /// Room size (0.0 to 1.0). Scales the impulse response length.
    pub room_size: f64,
    /// Target T60 decay time in seconds.
    pub decay_s: f64,
    /// Pre-delay before the wet signal, in milliseconds.
    pub pre_delay_ms: f64,
    /// Tail brightness (0.0 to 1.0). Controls the low-pass cutoff.
    pub brightness: f64,
    /// Dry/wet mix (0.0 = fully dry, 1.0 = fully wet).
    pub mix: f64,
}

impl Default for ReverbParams {
    fn default() -> Self {
        ReverbParams {
            room_size: 0.5,
            decay_s: 1.8,
            pre_delay_ms: 20.0,
            brightness: 0.6,
            mix: 0.25,
        }
    }
}

// ── Preset bank ─────────────────────────────────────────────

/// A named instrument preset — the parameter bag for one engine kind.
///
/// Serialized with an `engine` tag:
/// `{"engine": "pluck", "rho": 0.997, "body": "nylon"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "engine", rename_all = "lowercase")]
pub enum InstrumentPreset {
    Pluck(PluckParams),
    Additive(AdditiveParams),
    Sample(SampleParams),
}

/// Parse a JSON preset bank: a map from preset name to instrument preset.
pub fn parse_preset_bank(json: &str) -> Result<HashMap<String, InstrumentPreset>, RenderError> {
    Ok(serde_json::from_str(json)?)
}
