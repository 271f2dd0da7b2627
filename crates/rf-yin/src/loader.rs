//! Mono WAV loading
//!
//! Decodes a single-channel WAV file into normalized `f32` samples. Integer
//! PCM is scaled by `2^(bits-1)`; float PCM is passed through.

use std::path::Path;

use crate::error::{YinError, YinResult};

/// Decoded single-channel audio
#[derive(Debug, Clone, PartialEq)]
pub struct MonoAudio {
    /// Normalized samples
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl MonoAudio {
    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.samples.len() as f64 / self.sample_rate as f64
        }
    }
}

/// Load a mono WAV file
///
/// Multi-channel files are rejected rather than downmixed.
pub fn load_wav<P: AsRef<Path>>(path: P) -> YinResult<MonoAudio> {
    let path = path.as_ref();
    let path_str = path.display().to_string();
    let decode_err = |e: hound::Error| match e {
        hound::Error::IoError(io) => YinError::Io(io),
        other => YinError::Decode {
            path: path_str.clone(),
            message: other.to_string(),
        },
    };

    let reader = hound::WavReader::open(path).map_err(decode_err)?;
    let spec = reader.spec();

    if spec.channels != 1 {
        return Err(YinError::UnsupportedChannels(spec.channels));
    }
    if spec.sample_rate == 0 {
        return Err(YinError::InvalidSampleRate(spec.sample_rate));
    }

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(decode_err)?,
        hound::SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<Result<Vec<_>, _>>()
                .map_err(decode_err)?
        }
    };

    log::info!(
        "loaded {}: {} samples @ {} Hz ({}-bit {:?})",
        path_str,
        samples.len(),
        spec.sample_rate,
        spec.bits_per_sample,
        spec.sample_format
    );

    Ok(MonoAudio {
        samples,
        sample_rate: spec.sample_rate,
    })
}
