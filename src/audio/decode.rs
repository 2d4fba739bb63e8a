//! WAV decoding
//!
//! Turns an uploaded byte buffer into an [`AudioSample`]. Integer PCM of any
//! bit depth and 32-bit float data are accepted; values are passed through in
//! their raw units. Multi-channel files are averaged down to mono.

use std::io::{Cursor, Read};
use std::path::Path;

use hound::{SampleFormat, WavReader};
use num_traits::ToPrimitive;

use crate::audio::AudioSample;
use crate::error::{PcgError, Result};

/// Decode a WAV-encoded byte buffer
///
/// # Errors
/// * `EmptyAudio` - if the buffer or its sample data is empty
/// * `InvalidAudio` - if the buffer is not a readable WAV stream
/// * `UnsupportedFormat` - if the header describes data hound cannot read
pub fn decode_wav(bytes: &[u8]) -> Result<AudioSample> {
    if bytes.is_empty() {
        return Err(PcgError::EmptyAudio);
    }

    let reader = WavReader::new(Cursor::new(bytes)).map_err(|e| PcgError::InvalidAudio {
        reason: format!("Failed to parse WAV header: {}", e),
        source: Some(Box::new(e)),
    })?;

    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(PcgError::UnsupportedFormat {
            format: "0-channel audio".to_string(),
        });
    }

    let interleaved = match spec.sample_format {
        SampleFormat::Float => {
            if spec.bits_per_sample != 32 {
                return Err(PcgError::UnsupportedFormat {
                    format: format!("{}-bit float audio", spec.bits_per_sample),
                });
            }
            read_raw::<_, f32>(reader)?
        }
        SampleFormat::Int => read_raw::<_, i32>(reader)?,
    };

    if interleaved.is_empty() {
        return Err(PcgError::EmptyAudio);
    }

    let samples = if channels == 1 {
        interleaved
    } else {
        tracing::debug!(channels, "averaging multi-channel recording to mono");
        downmix(&interleaved, channels)
    };

    tracing::debug!(
        sample_rate = spec.sample_rate,
        bits = spec.bits_per_sample,
        samples = samples.len(),
        "decoded WAV buffer"
    );

    AudioSample::new(spec.sample_rate, samples)
}

/// Read a WAV file from disk and decode it
pub fn decode_wav_file(path: &Path) -> Result<AudioSample> {
    if !path.exists() {
        return Err(PcgError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let bytes = std::fs::read(path)?;
    decode_wav(&bytes)
}

// ============================================================================
// Internal helper functions
// ============================================================================

fn read_raw<R, S>(reader: WavReader<R>) -> Result<Vec<f64>>
where
    R: Read,
    S: hound::Sample + ToPrimitive,
{
    reader
        .into_samples::<S>()
        .map(|s| s.map(|v| v.to_f64().unwrap_or(0.0)))
        .collect::<std::result::Result<Vec<f64>, _>>()
        .map_err(|e| PcgError::InvalidAudio {
            reason: format!("Failed to read sample data: {}", e),
            source: Some(Box::new(e)),
        })
}

/// Average each interleaved frame into one value; a trailing partial frame is dropped
fn downmix(samples: &[f64], channels: usize) -> Vec<f64> {
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f64>() / channels as f64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::synth::{encode_wav, encode_wav_float};
    use hound::{WavSpec, WavWriter};

    fn stereo_bytes(frames: &[(i16, i16)]) -> Vec<u8> {
        let spec = WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            for (l, r) in frames {
                writer.write_sample(*l).unwrap();
                writer.write_sample(*r).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_empty_buffer() {
        assert!(matches!(decode_wav(&[]), Err(PcgError::EmptyAudio)));
    }

    #[test]
    fn test_garbage_buffer() {
        let err = decode_wav(b"definitely not a wav file").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_AUDIO");
    }

    #[test]
    fn test_header_without_samples() {
        let bytes = stereo_bytes(&[]);
        assert!(matches!(decode_wav(&bytes), Err(PcgError::EmptyAudio)));
    }

    #[test]
    fn test_16bit_values_are_raw() {
        let source = AudioSample::new(4000, vec![-32768.0, -1.0, 0.0, 12000.0, 32767.0]).unwrap();
        let decoded = decode_wav(&encode_wav(&source, 16).unwrap()).unwrap();
        assert_eq!(decoded, source);
    }

    #[test]
    fn test_24bit_values_are_raw() {
        let source = AudioSample::new(4000, vec![-8_388_608.0, 5.0, 8_388_607.0]).unwrap();
        let decoded = decode_wav(&encode_wav(&source, 24).unwrap()).unwrap();
        assert_eq!(decoded.samples(), source.samples());
    }

    #[test]
    fn test_8bit_values_are_signed() {
        let source = AudioSample::new(4000, vec![-128.0, 0.0, 127.0]).unwrap();
        let decoded = decode_wav(&encode_wav(&source, 8).unwrap()).unwrap();
        assert_eq!(decoded.samples(), source.samples());
    }

    #[test]
    fn test_float_values_pass_through() {
        let source = AudioSample::new(4000, vec![-0.5, 0.25, 1.5]).unwrap();
        let decoded = decode_wav(&encode_wav_float(&source).unwrap()).unwrap();
        assert_eq!(decoded.samples(), source.samples());
    }

    #[test]
    fn test_float_nan_is_rejected() {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 4000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            for v in [1.0f32, f32::NAN, -1.0, f32::INFINITY] {
                writer.write_sample(v).unwrap();
            }
            writer.finalize().unwrap();
        }

        let err = decode_wav(&cursor.into_inner()).unwrap_err();
        assert!(matches!(err, PcgError::InvalidAudio { .. }));
    }

    #[test]
    fn test_stereo_is_averaged() {
        let bytes = stereo_bytes(&[(100, 300), (-50, -150)]);
        let decoded = decode_wav(&bytes).unwrap();
        assert_eq!(decoded.sample_rate(), 8000);
        assert_eq!(decoded.samples(), &[200.0, -100.0]);
    }

    #[test]
    fn test_missing_file() {
        let err = decode_wav_file(Path::new("/nonexistent/valve.wav")).unwrap_err();
        assert!(matches!(err, PcgError::FileNotFound { .. }));
    }
}
