//! Hop-wise analysis pipeline
//!
//! Splits a sample buffer into non-overlapping hops of `hop_size` samples and
//! runs estimation + classification on each. Hops are independent, so the
//! same records come out of the lazy [`HopPipeline`] iterator and the
//! rayon-backed [`analyze_parallel`], always in ascending `hop_index` order.
//! A trailing remainder shorter than `hop_size` is dropped.

use std::iter::FusedIterator;
use std::sync::Arc;

use rayon::prelude::*;

use crate::classifier::PitchClassifier;
use crate::config::AnalysisConfig;
use crate::error::{YinError, YinResult};
use crate::estimator::{RawEstimate, YinEstimator};
use crate::table::StandardFrequencyTable;
use crate::Pitch;

/// Number of full hops in `len` samples
pub fn hop_count(len: usize, hop_size: usize) -> usize {
    if hop_size == 0 { 0 } else { len / hop_size }
}

/// Check config, sample rate and samples before any hop runs
pub fn validate_input(samples: &[f32], sample_rate: u32, config: &AnalysisConfig) -> YinResult<()> {
    if let Err(e) = config.validate() {
        log::warn!("rejecting analysis config: {}", e);
        return Err(e);
    }
    if sample_rate == 0 {
        log::warn!("rejecting zero sample rate");
        return Err(YinError::InvalidSampleRate(sample_rate));
    }
    if let Some((index, &value)) = samples.iter().enumerate().find(|(_, x)| !x.is_finite()) {
        log::warn!("rejecting input: non-finite sample at {}", index);
        return Err(YinError::NonFiniteSample { index, value });
    }
    Ok(())
}

fn log_plan(len: usize, config: &AnalysisConfig) {
    let hops = hop_count(len, config.hop_size);
    let dropped = len - hops * config.hop_size;
    if hops == 0 {
        log::debug!(
            "{} samples shorter than hop size {}, nothing to analyze",
            len,
            config.hop_size
        );
    } else {
        log::debug!(
            "analyzing {} hops of {} samples ({} trailing samples dropped)",
            hops,
            config.hop_size,
            dropped
        );
    }
}

fn build_pitch(hop_index: usize, raw: RawEstimate, classifier: &PitchClassifier) -> Pitch {
    let (nearest_std_frequency_hz, nearest_midi) = classifier.classify(raw.frequency_hz);
    log::trace!(
        "hop {}: {:.2} Hz (confidence {:.3}) -> midi {}",
        hop_index,
        raw.frequency_hz,
        raw.confidence,
        nearest_midi
    );
    Pitch {
        hop_index,
        frequency_hz: raw.frequency_hz,
        confidence: raw.confidence,
        nearest_std_frequency_hz,
        nearest_midi,
    }
}

/// Lazy, pull-based pitch sequence over a sample buffer
///
/// Each call to `next` analyzes exactly one hop. Dropping the pipeline stops
/// the analysis.
#[derive(Debug)]
pub struct HopPipeline<'a> {
    samples: &'a [f32],
    sample_rate: u32,
    hop_size: usize,
    next_hop: usize,
    total_hops: usize,
    estimator: YinEstimator,
    classifier: PitchClassifier,
}

impl<'a> HopPipeline<'a> {
    /// Validate inputs and prepare the pipeline; no hop is analyzed yet
    pub fn new(
        samples: &'a [f32],
        sample_rate: u32,
        config: &AnalysisConfig,
        table: Arc<StandardFrequencyTable>,
    ) -> YinResult<Self> {
        validate_input(samples, sample_rate, config)?;
        log_plan(samples.len(), config);

        Ok(Self {
            samples,
            sample_rate,
            hop_size: config.hop_size,
            next_hop: 0,
            total_hops: hop_count(samples.len(), config.hop_size),
            estimator: YinEstimator::new(config),
            classifier: PitchClassifier::new(table),
        })
    }

    /// Total number of records this pipeline will emit
    pub fn total_hops(&self) -> usize {
        self.total_hops
    }

    /// Hop size in samples
    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Sample rate of the analyzed buffer
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl Iterator for HopPipeline<'_> {
    type Item = Pitch;

    fn next(&mut self) -> Option<Pitch> {
        if self.next_hop >= self.total_hops {
            return None;
        }

        let hop_index = self.next_hop;
        self.next_hop += 1;

        let start = hop_index * self.hop_size;
        let hop = &self.samples[start..start + self.hop_size];
        let raw = self.estimator.estimate(hop, self.sample_rate);

        Some(build_pitch(hop_index, raw, &self.classifier))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total_hops - self.next_hop;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for HopPipeline<'_> {}

impl FusedIterator for HopPipeline<'_> {}

/// Analyze every hop on the rayon pool, results ordered by `hop_index`
pub fn analyze_parallel(
    samples: &[f32],
    sample_rate: u32,
    config: &AnalysisConfig,
    table: Arc<StandardFrequencyTable>,
) -> YinResult<Vec<Pitch>> {
    validate_input(samples, sample_rate, config)?;
    log_plan(samples.len(), config);

    let classifier = PitchClassifier::new(table);

    let pitches = samples
        .par_chunks_exact(config.hop_size)
        .enumerate()
        .map_init(
            || YinEstimator::new(config),
            |estimator, (hop_index, hop)| {
                let raw = estimator.estimate(hop, sample_rate);
                build_pitch(hop_index, raw, &classifier)
            },
        )
        .collect();

    Ok(pitches)
}
