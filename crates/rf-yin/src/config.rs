//! Analysis configuration

use serde::{Deserialize, Serialize};

use crate::error::{YinError, YinResult};

/// Default YIN absolute threshold
pub const DEFAULT_ABSOLUTE_THRESHOLD: f32 = 0.05;

/// Default A4 reference tuning (Hz)
pub const DEFAULT_REFERENCE_A4_HZ: f32 = 440.0;

/// Default mean-square energy at or below which a hop counts as silent
pub const DEFAULT_SILENCE_EPSILON: f32 = 1e-10;

/// Default hop size (samples). Lowest reliable pitch is ~`2 * sample_rate / hop_size`.
pub const DEFAULT_HOP_SIZE: usize = 2048;

/// What to report when no lag dips below the absolute threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoPitchPolicy {
    /// Report the hop as unvoiced (frequency -1, confidence 0)
    #[default]
    Unvoiced,
    /// Fall back to the lag with the smallest CMND value
    GlobalMinimum,
}

/// Options recognized by the analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Samples per hop (time/frequency resolution trade-off)
    pub hop_size: usize,

    /// CMND dip required to accept a lag, in (0, 1)
    #[serde(default = "default_threshold")]
    pub absolute_threshold: f32,

    /// Frequency of A4 used to build the standard table
    #[serde(default = "default_reference")]
    pub reference_a4_hz: f32,

    /// Fallback when the threshold search finds nothing
    #[serde(default)]
    pub no_pitch_policy: NoPitchPolicy,

    /// Mean-square energy treated as silence
    #[serde(default = "default_silence_epsilon")]
    pub silence_epsilon: f32,
}

fn default_threshold() -> f32 {
    DEFAULT_ABSOLUTE_THRESHOLD
}

fn default_reference() -> f32 {
    DEFAULT_REFERENCE_A4_HZ
}

fn default_silence_epsilon() -> f32 {
    DEFAULT_SILENCE_EPSILON
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HOP_SIZE)
    }
}

impl AnalysisConfig {
    /// Create config for the given hop size, everything else at defaults
    pub fn new(hop_size: usize) -> Self {
        Self {
            hop_size,
            absolute_threshold: DEFAULT_ABSOLUTE_THRESHOLD,
            reference_a4_hz: DEFAULT_REFERENCE_A4_HZ,
            no_pitch_policy: NoPitchPolicy::default(),
            silence_epsilon: DEFAULT_SILENCE_EPSILON,
        }
    }

    /// Set absolute threshold
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.absolute_threshold = threshold;
        self
    }

    /// Set A4 reference tuning
    pub fn with_reference(mut self, reference_a4_hz: f32) -> Self {
        self.reference_a4_hz = reference_a4_hz;
        self
    }

    /// Set no-pitch fallback policy
    pub fn with_policy(mut self, policy: NoPitchPolicy) -> Self {
        self.no_pitch_policy = policy;
        self
    }

    /// Set silence epsilon
    pub fn with_silence_epsilon(mut self, epsilon: f32) -> Self {
        self.silence_epsilon = epsilon;
        self
    }

    /// Check every option, first failure wins
    pub fn validate(&self) -> YinResult<()> {
        if self.hop_size == 0 {
            return Err(YinError::InvalidHopSize(self.hop_size));
        }
        // Negated comparisons also reject NaN
        if !(self.absolute_threshold > 0.0 && self.absolute_threshold < 1.0) {
            return Err(YinError::InvalidThreshold(self.absolute_threshold));
        }
        if !(self.reference_a4_hz.is_finite() && self.reference_a4_hz > 0.0) {
            return Err(YinError::InvalidReference(self.reference_a4_hz));
        }
        if !(self.silence_epsilon.is_finite() && self.silence_epsilon >= 0.0) {
            return Err(YinError::InvalidSilenceEpsilon(self.silence_epsilon));
        }
        Ok(())
    }

    /// Parse from JSON and validate
    pub fn from_json(json: &str) -> YinResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| YinError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> YinResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| YinError::Config(e.to_string()))
    }

    /// Approximate lowest frequency a hop of this size can resolve
    pub fn lowest_detectable_hz(&self, sample_rate: u32) -> f32 {
        if self.hop_size == 0 {
            return f32::INFINITY;
        }
        2.0 * sample_rate as f32 / self.hop_size as f32
    }
}
