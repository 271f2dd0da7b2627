//! YIN fundamental frequency estimation
//!
//! One estimate per fixed-length window:
//! 1. Silence gate on mean-square energy
//! 2. Difference function `d[τ]`
//! 3. Cumulative mean normalized difference (CMND)
//! 4. First local minimum below the absolute threshold
//! 5. Fallback per [`NoPitchPolicy`] when nothing clears the threshold
//! 6. Parabolic interpolation of the accepted lag
//!
//! Every outcome is a [`RawEstimate`]; degenerate windows resolve to the
//! no-pitch sentinel instead of an error.

use crate::classifier::NO_PITCH_HZ;
use crate::config::{AnalysisConfig, NoPitchPolicy};

/// Frequency/confidence pair for a single window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawEstimate {
    /// Estimated fundamental (Hz), or -1 when no pitch was found
    pub frequency_hz: f32,
    /// 1 - CMND at the accepted lag, in [0, 1]
    pub confidence: f32,
}

impl RawEstimate {
    /// The "no pitch found" sentinel
    pub const NO_PITCH: Self = Self {
        frequency_hz: NO_PITCH_HZ,
        confidence: 0.0,
    };

    /// True when a frequency was produced
    pub fn is_voiced(&self) -> bool {
        self.frequency_hz != NO_PITCH_HZ
    }
}

/// YIN estimator with reusable scratch buffers
///
/// Buffers are fully rewritten on every call, so results never depend on
/// previously analyzed windows.
#[derive(Debug, Clone)]
pub struct YinEstimator {
    /// CMND acceptance threshold
    threshold: f32,
    /// Fallback when no lag clears the threshold
    policy: NoPitchPolicy,
    /// Mean-square energy treated as silence
    silence_epsilon: f32,
    /// Difference function
    diff_buffer: Vec<f32>,
    /// Cumulative mean normalized difference
    cmnd_buffer: Vec<f32>,
}

impl YinEstimator {
    /// Create estimator sized for `config.hop_size`
    pub fn new(config: &AnalysisConfig) -> Self {
        let half = config.hop_size / 2;
        Self {
            threshold: config.absolute_threshold,
            policy: config.no_pitch_policy,
            silence_epsilon: config.silence_epsilon,
            diff_buffer: vec![0.0; half],
            cmnd_buffer: vec![0.0; half],
        }
    }

    /// Absolute threshold in use
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Fallback policy in use
    pub fn policy(&self) -> NoPitchPolicy {
        self.policy
    }

    /// Estimate the fundamental of one window
    pub fn estimate(&mut self, hop: &[f32], sample_rate: u32) -> RawEstimate {
        let half = hop.len() / 2;
        if half < 2 || sample_rate == 0 {
            return RawEstimate::NO_PITCH;
        }

        let energy = mean_square(hop);
        // Overflowed energy leaves nothing to normalize against
        if !energy.is_finite() || energy <= self.silence_epsilon {
            return RawEstimate::NO_PITCH;
        }

        self.reset(half);
        self.difference_function(hop);
        if !self.cumulative_mean_normalized_difference() {
            log::trace!("difference sums overflowed, reporting no pitch");
            return RawEstimate::NO_PITCH;
        }

        let tau = match self.absolute_threshold_search() {
            Some(tau) => tau,
            None => match self.policy {
                NoPitchPolicy::Unvoiced => return RawEstimate::NO_PITCH,
                NoPitchPolicy::GlobalMinimum => match self.global_minimum() {
                    Some(tau) => {
                        log::trace!("no lag below threshold, using global minimum at {}", tau);
                        tau
                    }
                    None => return RawEstimate::NO_PITCH,
                },
            },
        };

        let tau_refined = self.parabolic_interpolation(tau);
        let confidence = (1.0 - self.cmnd_buffer[tau]).clamp(0.0, 1.0);
        let confidence = if confidence.is_nan() { 0.0 } else { confidence };

        RawEstimate {
            frequency_hz: sample_rate as f32 / tau_refined,
            confidence,
        }
    }

    /// CMND values of the last window that passed the silence gate
    pub fn cmnd(&self) -> &[f32] {
        &self.cmnd_buffer
    }

    /// Size both buffers to `half` and clear them
    fn reset(&mut self, half: usize) {
        self.diff_buffer.clear();
        self.diff_buffer.resize(half, 0.0);
        self.cmnd_buffer.clear();
        self.cmnd_buffer.resize(half, 0.0);
    }

    /// `d[τ] = Σ (x[j] - x[j+τ])²` over the whole window
    fn difference_function(&mut self, hop: &[f32]) {
        let n = hop.len();
        for tau in 1..self.diff_buffer.len() {
            let sum: f32 = hop[..n - tau]
                .iter()
                .zip(&hop[tau..])
                .map(|(a, b)| {
                    let diff = a - b;
                    diff * diff
                })
                .sum();
            self.diff_buffer[tau] = sum;
        }
    }

    /// Returns false when the running sum overflows `f32`
    fn cumulative_mean_normalized_difference(&mut self) -> bool {
        self.cmnd_buffer[0] = 1.0;
        let mut running_sum = 0.0f32;

        for tau in 1..self.diff_buffer.len() {
            running_sum += self.diff_buffer[tau];
            if !running_sum.is_finite() {
                return false;
            }
            self.cmnd_buffer[tau] = if running_sum > 0.0 {
                self.diff_buffer[tau] * tau as f32 / running_sum
            } else {
                1.0
            };
        }
        true
    }

    /// First lag below threshold that is also a local minimum
    fn absolute_threshold_search(&self) -> Option<usize> {
        let cmnd = &self.cmnd_buffer;
        let last = cmnd.len() - 1;

        (1..=last).find(|&tau| {
            cmnd[tau] < self.threshold && (tau == last || cmnd[tau] <= cmnd[tau + 1])
        })
    }

    /// Lag with the smallest CMND (earliest on ties)
    fn global_minimum(&self) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for (tau, &value) in self.cmnd_buffer.iter().enumerate().skip(1) {
            if !value.is_finite() {
                continue;
            }
            if best.is_none_or(|(_, best_value)| value < best_value) {
                best = Some((tau, value));
            }
        }
        best.map(|(tau, _)| tau)
    }

    /// Sub-sample lag from the parabola through `cmnd[τ-1..=τ+1]`
    fn parabolic_interpolation(&self, tau: usize) -> f32 {
        if tau == 0 || tau + 1 >= self.cmnd_buffer.len() {
            return tau as f32;
        }

        let s0 = self.cmnd_buffer[tau - 1];
        let s1 = self.cmnd_buffer[tau];
        let s2 = self.cmnd_buffer[tau + 1];

        let adjustment = (s2 - s0) / (2.0 * (2.0 * s1 - s0 - s2));

        if adjustment.is_finite() && adjustment.abs() < 1.0 {
            tau as f32 + adjustment
        } else {
            tau as f32
        }
    }
}

/// One-shot estimate with a fresh workspace and default policy/epsilon
pub fn estimate(hop: &[f32], sample_rate: u32, absolute_threshold: f32) -> RawEstimate {
    let config = AnalysisConfig::new(hop.len()).with_threshold(absolute_threshold);
    YinEstimator::new(&config).estimate(hop, sample_rate)
}

fn mean_square(hop: &[f32]) -> f32 {
    if hop.is_empty() {
        return 0.0;
    }
    hop.iter().map(|x| x * x).sum::<f32>() / hop.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate_sine(freq: f32, sample_rate: u32, num_samples: usize) -> Vec<f32> {
        (0..num_samples)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    /// Reproducible white noise in [-1, 1]
    fn generate_noise(num_samples: usize, seed: u64) -> Vec<f32> {
        let mut state = seed;
        (0..num_samples)
            .map(|_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                ((state >> 11) as f64 / (1u64 << 53) as f64 * 2.0 - 1.0) as f32
            })
            .collect()
    }

    #[test]
    fn test_sine_440() {
        let samples = generate_sine(440.0, 44100, 2048);
        let result = estimate(&samples, 44100, 0.05);

        assert!(result.is_voiced());
        assert!(
            (result.frequency_hz - 440.0).abs() < 1.0,
            "Expected ~440 Hz, got {}",
            result.frequency_hz
        );
        assert!(result.confidence > 0.9, "confidence {}", result.confidence);
    }

    #[test]
    fn test_sine_sweep_within_one_percent() {
        for (freq, sample_rate) in [
            (100.0, 44100),
            (220.0, 44100),
            (523.25, 44100),
            (1000.0, 48000),
            (2000.0, 48000),
        ] {
            let samples = generate_sine(freq, sample_rate, 2048);
            let result = estimate(&samples, sample_rate, 0.05);
            let error = (result.frequency_hz - freq).abs() / freq;
            assert!(
                error < 0.01,
                "{} Hz @ {}: got {}",
                freq,
                sample_rate,
                result.frequency_hz
            );
            assert!(result.confidence > 0.9, "{} Hz confidence {}", freq, result.confidence);
        }
    }

    #[test]
    fn test_silence() {
        let samples = vec![0.0; 2048];
        let result = estimate(&samples, 44100, 0.05);
        assert_eq!(result, RawEstimate::NO_PITCH);
        assert_eq!(result.frequency_hz, -1.0);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_silence_with_zero_epsilon() {
        let config = AnalysisConfig::new(2048).with_silence_epsilon(0.0);
        let mut estimator = YinEstimator::new(&config);
        assert_eq!(
            estimator.estimate(&vec![0.0; 2048], 44100),
            RawEstimate::NO_PITCH
        );
    }

    #[test]
    fn test_silence_epsilon_gates_quiet_signal() {
        let quiet: Vec<f32> = generate_sine(440.0, 44100, 2048)
            .into_iter()
            .map(|x| x * 1e-4)
            .collect();

        // Mean square is ~5e-9
        let config = AnalysisConfig::new(2048).with_silence_epsilon(1e-6);
        let mut estimator = YinEstimator::new(&config);
        assert_eq!(estimator.estimate(&quiet, 44100), RawEstimate::NO_PITCH);

        let config = AnalysisConfig::new(2048);
        let mut estimator = YinEstimator::new(&config);
        let result = estimator.estimate(&quiet, 44100);
        assert!((result.frequency_hz - 440.0).abs() < 5.0, "got {}", result.frequency_hz);
    }

    #[test]
    fn test_overflowing_signal_unvoiced() {
        let config = AnalysisConfig::new(2048).with_policy(NoPitchPolicy::GlobalMinimum);
        let mut estimator = YinEstimator::new(&config);

        // Energy itself overflows
        let huge: Vec<f32> = generate_sine(440.0, 44100, 2048)
            .into_iter()
            .map(|x| x * 1e20)
            .collect();
        assert_eq!(estimator.estimate(&huge, 44100), RawEstimate::NO_PITCH);

        // Energy fits, cumulative difference sums do not
        let loud: Vec<f32> = generate_sine(440.0, 44100, 2048)
            .into_iter()
            .map(|x| x * 1e17)
            .collect();
        let result = estimator.estimate(&loud, 44100);
        assert!(result.frequency_hz.is_finite());
        assert!((0.0..=1.0).contains(&result.confidence), "{:?}", result);
    }

    #[test]
    fn test_near_minimum_hop_size() {
        // Period just inside the scanned lag range, room left for interpolation
        for (freq, sample_rate) in [(441.0, 44100), (430.0, 44100), (1000.0, 48000)] {
            let period = sample_rate as f32 / freq;
            let hop_size = 2 * period.ceil() as usize + 4;
            let samples = generate_sine(freq, sample_rate, hop_size);
            let result = estimate(&samples, sample_rate, 0.05);

            let error = (result.frequency_hz - freq).abs() / freq;
            assert!(
                error < 0.01,
                "{} Hz, hop {}: got {}",
                freq,
                hop_size,
                result.frequency_hz
            );
            assert!(result.confidence > 0.9, "{} Hz confidence {}", freq, result.confidence);
        }
    }

    #[test]
    fn test_constant_signal_unvoiced() {
        let samples = vec![0.5; 2048];
        let result = estimate(&samples, 44100, 0.05);
        assert_eq!(result, RawEstimate::NO_PITCH);
    }

    #[test]
    fn test_noise_unvoiced_policy() {
        let samples = generate_noise(2048, 42);
        let config = AnalysisConfig::new(2048).with_policy(NoPitchPolicy::Unvoiced);
        let mut estimator = YinEstimator::new(&config);
        assert_eq!(estimator.estimate(&samples, 44100), RawEstimate::NO_PITCH);
    }

    #[test]
    fn test_noise_global_minimum_policy() {
        let samples = generate_noise(2048, 42);
        let config = AnalysisConfig::new(2048).with_policy(NoPitchPolicy::GlobalMinimum);
        let mut estimator = YinEstimator::new(&config);
        let result = estimator.estimate(&samples, 44100);

        assert!(result.is_voiced());
        assert!(result.frequency_hz > 0.0 && result.frequency_hz.is_finite());
        assert!((0.0..=1.0).contains(&result.confidence));
        // Noise never dips anywhere near a clean period
        assert!(result.confidence < 0.6, "confidence {}", result.confidence);
    }

    #[test]
    fn test_global_minimum_agrees_on_clean_signal() {
        let samples = generate_sine(330.0, 44100, 2048);
        let strict = estimate(&samples, 44100, 0.05);

        let config = AnalysisConfig::new(2048).with_policy(NoPitchPolicy::GlobalMinimum);
        let fallback = YinEstimator::new(&config).estimate(&samples, 44100);
        assert_eq!(strict, fallback);
    }

    #[test]
    fn test_prefers_smallest_period() {
        // Fundamental plus strong octave: the first dip is the fundamental period
        let samples: Vec<f32> = (0..2048)
            .map(|i| {
                let t = i as f32 / 44100.0;
                let w = 2.0 * std::f32::consts::PI * 220.0;
                0.6 * (w * t).sin() + 0.4 * (2.0 * w * t).sin()
            })
            .collect();
        let result = estimate(&samples, 44100, 0.05);
        assert!((result.frequency_hz - 220.0).abs() < 2.2, "got {}", result.frequency_hz);
    }

    #[test]
    fn test_workspace_reset_between_hops() {
        let config = AnalysisConfig::new(2048);
        let mut reused = YinEstimator::new(&config);

        let a = generate_sine(440.0, 44100, 2048);
        let b = generate_sine(196.0, 44100, 2048);

        let first = reused.estimate(&a, 44100);
        let _ = reused.estimate(&vec![0.0; 2048], 44100);
        let _ = reused.estimate(&b, 44100);
        let again = reused.estimate(&a, 44100);

        assert_eq!(first, again);
        assert_eq!(first, YinEstimator::new(&config).estimate(&a, 44100));
    }

    #[test]
    fn test_tiny_windows() {
        for len in 0..4 {
            let samples = vec![0.3; len];
            assert_eq!(estimate(&samples, 44100, 0.05), RawEstimate::NO_PITCH);
        }
        assert_eq!(estimate(&[0.0, 1.0, 0.0, -1.0], 0, 0.05), RawEstimate::NO_PITCH);
    }

    #[test]
    fn test_cmnd_starts_at_one() {
        let config = AnalysisConfig::new(1024);
        let mut estimator = YinEstimator::new(&config);
        estimator.estimate(&generate_sine(440.0, 44100, 1024), 44100);
        assert_eq!(estimator.cmnd().len(), 512);
        assert_eq!(estimator.cmnd()[0], 1.0);
        assert!((estimator.cmnd()[1] - 1.0).abs() < 1e-6);
    }
}
