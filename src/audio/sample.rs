//! Decoded recording in raw amplitude units

use crate::error::{PcgError, Result};

/// A decoded mono recording.
///
/// Amplitudes keep the units of the source file (e.g. -32768..32767 for
/// 16-bit PCM). Nothing downstream renormalizes them.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSample {
    sample_rate: u32,
    samples: Vec<f64>,
}

impl AudioSample {
    /// Create a recording, rejecting a zero sample rate, an empty sequence
    /// or any non-finite amplitude
    pub fn new(sample_rate: u32, samples: Vec<f64>) -> Result<Self> {
        if sample_rate == 0 {
            return Err(PcgError::InvalidAudio {
                reason: "sample rate is zero".to_string(),
                source: None,
            });
        }
        if samples.is_empty() {
            return Err(PcgError::EmptyAudio);
        }
        if let Some(index) = samples.iter().position(|v| !v.is_finite()) {
            return Err(PcgError::InvalidAudio {
                reason: format!("sample {} is not a finite number", index),
                source: None,
            });
        }
        Ok(Self {
            sample_rate,
            samples,
        })
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Raw amplitude values
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false; kept for clippy's `len_without_is_empty`
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}
