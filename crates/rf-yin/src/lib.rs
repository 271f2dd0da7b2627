//! ReelForge YIN Pitch Estimator
//!
//! Hop-by-hop fundamental frequency estimation for monophonic audio:
//!
//! ## Features
//! - **YIN Estimation**: Difference function, CMND, absolute threshold, parabolic refinement
//! - **Note Annotation**: Nearest equal-tempered frequency and MIDI number (A0..C8)
//! - **Lazy Pipeline**: Pull one hop at a time, stop whenever
//! - **Parallel Mode**: Fan hops out on rayon, ordered results
//! - **WAV Input**: Mono WAV loading via hound
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rf_yin::{AnalysisConfig, Analyzer};
//!
//! let analyzer = Analyzer::new(AnalysisConfig::new(2048))?;
//! for pitch in analyzer.analyze(&samples, 44100)? {
//!     if pitch.is_voiced() {
//!         println!("{} Hz -> MIDI {}", pitch.frequency_hz, pitch.nearest_midi);
//!     }
//! }
//! ```

pub mod classifier;
pub mod config;
pub mod estimator;
pub mod loader;
pub mod pipeline;
pub mod table;

mod error;

pub use classifier::{NO_PITCH_HZ, PitchClassifier};
pub use config::{AnalysisConfig, NoPitchPolicy};
pub use error::{YinError, YinResult};
pub use estimator::{RawEstimate, YinEstimator};
pub use loader::{MonoAudio, load_wav};
pub use pipeline::HopPipeline;
pub use table::StandardFrequencyTable;

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Pitch estimate for one hop
///
/// `frequency_hz == -1` exactly when `nearest_midi == 0` and
/// `nearest_std_frequency_hz == 0`, meaning no pitch was found.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pitch {
    /// Position of the hop in the buffer (0-based)
    pub hop_index: usize,
    /// Estimated fundamental (Hz), -1 when unvoiced
    pub frequency_hz: f32,
    /// Estimate confidence (0-1)
    pub confidence: f32,
    /// Closest equal-tempered frequency, 0 when unvoiced
    pub nearest_std_frequency_hz: f32,
    /// Closest MIDI note (21-108), 0 when unvoiced
    pub nearest_midi: u8,
}

impl Pitch {
    /// True when a pitch was found
    pub fn is_voiced(&self) -> bool {
        self.nearest_midi != 0
    }

    /// First sample of this hop
    pub fn start_sample(&self, hop_size: usize) -> usize {
        self.hop_index * hop_size
    }

    /// Start of this hop in seconds
    pub fn start_seconds(&self, hop_size: usize, sample_rate: u32) -> f64 {
        self.start_sample(hop_size) as f64 / sample_rate as f64
    }

    /// Deviation from the nearest standard pitch in cents
    pub fn cents_off(&self) -> Option<f32> {
        if !self.is_voiced() {
            return None;
        }
        Some(1200.0 * (self.frequency_hz / self.nearest_std_frequency_hz).log2())
    }
}

/// Analysis session
///
/// Holds a validated configuration and the standard frequency table, which is
/// built once and shared by every pipeline the session creates.
#[derive(Debug, Clone)]
pub struct Analyzer {
    config: AnalysisConfig,
    table: Arc<StandardFrequencyTable>,
}

impl Analyzer {
    /// Validate configuration and build the table
    pub fn new(config: AnalysisConfig) -> YinResult<Self> {
        config.validate()?;
        let table = Arc::new(StandardFrequencyTable::build(config.reference_a4_hz));
        Ok(Self { config, table })
    }

    /// Get configuration
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Shared frequency table
    pub fn table(&self) -> &Arc<StandardFrequencyTable> {
        &self.table
    }

    /// Lazy per-hop analysis of a sample buffer
    pub fn analyze<'a>(&self, samples: &'a [f32], sample_rate: u32) -> YinResult<HopPipeline<'a>> {
        HopPipeline::new(samples, sample_rate, &self.config, Arc::clone(&self.table))
    }

    /// Analyze all hops in parallel, ordered by `hop_index`
    pub fn analyze_parallel(&self, samples: &[f32], sample_rate: u32) -> YinResult<Vec<Pitch>> {
        pipeline::analyze_parallel(samples, sample_rate, &self.config, Arc::clone(&self.table))
    }

    /// Load a mono WAV file and analyze every hop
    pub fn analyze_file<P: AsRef<Path>>(&self, path: P) -> YinResult<Vec<Pitch>> {
        let audio = load_wav(path)?;
        Ok(self.analyze(&audio.samples, audio.sample_rate)?.collect())
    }
}

/// Analyze with default reference tuning and no-pitch policy
pub fn analyze(
    samples: &[f32],
    sample_rate: u32,
    hop_size: usize,
    absolute_threshold: f32,
) -> YinResult<HopPipeline<'_>> {
    let config = AnalysisConfig::new(hop_size).with_threshold(absolute_threshold);
    Analyzer::new(config)?.analyze(samples, sample_rate)
}
