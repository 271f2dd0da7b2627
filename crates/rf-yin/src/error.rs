//! Error types for YIN analysis

use thiserror::Error;

/// Analysis errors
///
/// Only configuration and decoding problems surface here. A hop without a
/// detectable pitch is reported as sentinel data on [`crate::Pitch`].
#[derive(Debug, Error)]
pub enum YinError {
    /// Hop size must be at least one sample
    #[error("Invalid hop size: {0}")]
    InvalidHopSize(usize),

    /// Absolute threshold outside (0, 1)
    #[error("Invalid absolute threshold: {0}, expected a value in (0, 1)")]
    InvalidThreshold(f32),

    /// Reference tuning must be positive and finite
    #[error("Invalid reference frequency: {0} Hz")]
    InvalidReference(f32),

    /// Silence epsilon must be non-negative and finite
    #[error("Invalid silence epsilon: {0}")]
    InvalidSilenceEpsilon(f32),

    /// Invalid sample rate
    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(u32),

    /// Input buffer contains NaN or infinity
    #[error("Non-finite sample at index {index}: {value}")]
    NonFiniteSample { index: usize, value: f32 },

    /// Configuration (de)serialization failed
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error while reading audio
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Audio container could not be decoded
    #[error("Failed to decode {path}: {message}")]
    Decode { path: String, message: String },

    /// Only single-channel audio is analyzed
    #[error("Unsupported channel count: {0}, expected mono")]
    UnsupportedChannels(u16),
}

/// Result type for YIN operations
pub type YinResult<T> = Result<T, YinError>;
