//! Synthetic recordings and WAV encoding
//!
//! Used for fixtures, tests and the `synth` command. Values are written in
//! raw units, so a recording encoded here decodes back to the same numbers
//! as long as they fit the chosen bit depth.

use std::io::Cursor;
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::audio::AudioSample;
use crate::error::{PcgError, Result};

/// A recording where every sample has the same value
pub fn constant(value: f64, duration_secs: f64, sample_rate: u32) -> Result<AudioSample> {
    let num_samples = sample_count(duration_secs, sample_rate);
    AudioSample::new(sample_rate, vec![value; num_samples])
}

/// A recording alternating `+amplitude`, `-amplitude`, ...
pub fn alternating(amplitude: f64, duration_secs: f64, sample_rate: u32) -> Result<AudioSample> {
    let num_samples = sample_count(duration_secs, sample_rate);
    let samples = (0..num_samples)
        .map(|i| if i % 2 == 0 { amplitude } else { -amplitude })
        .collect();
    AudioSample::new(sample_rate, samples)
}

/// A sine tone with the given peak amplitude (rounded to whole units)
pub fn sine_tone(
    frequency: f64,
    amplitude: f64,
    duration_secs: f64,
    sample_rate: u32,
) -> Result<AudioSample> {
    let num_samples = sample_count(duration_secs, sample_rate);
    let angular_freq = 2.0 * std::f64::consts::PI * frequency / sample_rate.max(1) as f64;
    let samples = (0..num_samples)
        .map(|i| (amplitude * (angular_freq * i as f64).sin()).round())
        .collect();
    AudioSample::new(sample_rate, samples)
}

/// Encode a recording as mono integer PCM
///
/// Values are rounded and must fit the signed range of `bits_per_sample`.
pub fn encode_wav(sample: &AudioSample, bits_per_sample: u16) -> Result<Vec<u8>> {
    if !matches!(bits_per_sample, 8 | 16 | 24 | 32) {
        return Err(PcgError::UnsupportedFormat {
            format: format!("{}-bit integer audio (only 8, 16, 24, 32 supported)", bits_per_sample),
        });
    }
    let max = ((1i64 << (bits_per_sample - 1)) - 1) as f64;
    let min = -((1i64 << (bits_per_sample - 1)) as f64);

    let spec = WavSpec {
        channels: 1,
        sample_rate: sample.sample_rate(),
        bits_per_sample,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec).map_err(write_error)?;
        for &value in sample.samples() {
            let rounded = value.round();
            if rounded < min || rounded > max {
                return Err(PcgError::InvalidParameter {
                    param: "sample".to_string(),
                    value: value.to_string(),
                    expected: format!("{} to {} for {}-bit audio", min, max, bits_per_sample),
                });
            }
            writer.write_sample(rounded as i32).map_err(write_error)?;
        }
        writer.finalize().map_err(write_error)?;
    }

    Ok(cursor.into_inner())
}

/// Encode a recording as mono 32-bit float
pub fn encode_wav_float(sample: &AudioSample) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: sample.sample_rate(),
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec).map_err(write_error)?;
        for &value in sample.samples() {
            writer.write_sample(value as f32).map_err(write_error)?;
        }
        writer.finalize().map_err(write_error)?;
    }

    Ok(cursor.into_inner())
}

/// Encode as integer PCM and write to `path`
pub fn write_wav_file(sample: &AudioSample, path: &Path, bits_per_sample: u16) -> Result<()> {
    let bytes = encode_wav(sample, bits_per_sample)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

fn sample_count(duration_secs: f64, sample_rate: u32) -> usize {
    (duration_secs * sample_rate as f64).round().max(0.0) as usize
}

fn write_error(e: hound::Error) -> PcgError {
    PcgError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_length() {
        let sample = constant(0.0, 1.0, 1000).unwrap();
        assert_eq!(sample.len(), 1000);
        assert!(sample.samples().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_alternating_pattern() {
        let sample = alternating(12000.0, 0.004, 1000).unwrap();
        assert_eq!(sample.samples(), &[12000.0, -12000.0, 12000.0, -12000.0]);
    }

    #[test]
    fn test_sine_peak() {
        let sample = sine_tone(50.0, 1000.0, 1.0, 8000).unwrap();
        let peak = sample.samples().iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        assert!((peak - 1000.0).abs() <= 1.0);
    }

    #[test]
    fn test_zero_duration_is_rejected() {
        assert!(constant(0.0, 0.0, 1000).is_err());
    }

    #[test]
    fn test_encode_rejects_out_of_range() {
        let sample = AudioSample::new(1000, vec![40000.0]).unwrap();
        let err = encode_wav(&sample, 16).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PARAMETER");
    }

    #[test]
    fn test_encode_rejects_odd_depth() {
        let sample = AudioSample::new(1000, vec![1.0]).unwrap();
        assert!(encode_wav(&sample, 12).is_err());
    }
}
