//! Short-time spectral statistics
//!
//! Frames of `frame_size` samples (Hann window, `hop_size` hop) are
//! transformed with rustfft. A recording shorter than one frame is
//! zero-padded into a single frame, so every input yields at least one.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// STFT and mel filter bank parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralConfig {
    /// Samples per frame (power of two keeps rustfft on its fast path)
    pub frame_size: usize,
    /// Samples between frame starts
    pub hop_size: usize,
    /// Triangular mel bands
    pub mel_bands: usize,
    /// Cepstral coefficients kept after the DCT
    pub mfcc_count: usize,
    /// Lowest mel band edge in Hz (upper edge is Nyquist)
    pub f_min: f64,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            frame_size: 1024,
            hop_size: 512,
            mel_bands: 26,
            mfcc_count: 13,
            f_min: 20.0,
        }
    }
}

/// Frame-averaged spectral features
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralSummary {
    pub spectral_centroid_hz: f64,
    pub mfcc_means: Vec<f64>,
    pub frame_count: usize,
}

/// Compute the frame-averaged centroid and MFCC means
pub fn spectral_summary(samples: &[f64], sample_rate: u32, config: &SpectralConfig) -> SpectralSummary {
    let frame_size = config.frame_size.max(2);
    let hop_size = config.hop_size.max(1);

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(frame_size);
    let window = hann_window(frame_size);
    let mel = MelBank::new(
        sample_rate,
        frame_size,
        config.mel_bands,
        config.f_min,
        sample_rate as f64 / 2.0,
    );

    let mut centroid_sum = 0.0;
    let mut mfcc_sums = vec![0.0; config.mfcc_count];
    let mut frame_count = 0usize;
    let mut buffer = vec![Complex::new(0.0, 0.0); frame_size];

    let mut start = 0usize;
    loop {
        for (i, slot) in buffer.iter_mut().enumerate() {
            let value = samples.get(start + i).copied().unwrap_or(0.0);
            *slot = Complex::new(value * window[i], 0.0);
        }
        fft.process(&mut buffer);

        let power: Vec<f64> = buffer[..=frame_size / 2]
            .iter()
            .map(|c| c.norm_sqr())
            .collect();

        centroid_sum += centroid(&power, sample_rate, frame_size);
        for (sum, coeff) in mfcc_sums
            .iter_mut()
            .zip(mel.mfcc_from_power(&power, config.mfcc_count))
        {
            *sum += coeff;
        }
        frame_count += 1;

        if start + frame_size >= samples.len() {
            break;
        }
        start += hop_size;
    }

    let frames = frame_count as f64;
    SpectralSummary {
        spectral_centroid_hz: centroid_sum / frames,
        mfcc_means: mfcc_sums.into_iter().map(|s| s / frames).collect(),
        frame_count,
    }
}

fn hann_window(length: usize) -> Vec<f64> {
    if length <= 1 {
        return vec![1.0; length.max(1)];
    }
    let denom = (length - 1) as f64;
    (0..length)
        .map(|n| 0.5 * (1.0 - (2.0 * std::f64::consts::PI * n as f64 / denom).cos()))
        .collect()
}

/// Power-weighted mean frequency of one frame; 0 for a silent frame
fn centroid(power: &[f64], sample_rate: u32, frame_size: usize) -> f64 {
    let bin_hz = sample_rate as f64 / frame_size as f64;
    let total: f64 = power.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    power
        .iter()
        .enumerate()
        .map(|(k, p)| k as f64 * bin_hz * p)
        .sum::<f64>()
        / total
}

struct MelBank {
    filters: Vec<Vec<(usize, f64)>>,
}

impl MelBank {
    fn new(sample_rate: u32, frame_size: usize, bands: usize, f_min: f64, f_max: f64) -> Self {
        let f_max = f_max.max(f_min);
        let mel_min = hz_to_mel(f_min);
        let mel_max = hz_to_mel(f_max);
        let edges: Vec<usize> = (0..bands + 2)
            .map(|i| {
                let mel = mel_min + (mel_max - mel_min) * i as f64 / (bands + 1) as f64;
                freq_to_bin(mel_to_hz(mel), sample_rate, frame_size)
            })
            .collect();

        let filters = (0..bands)
            .map(|m| {
                let left = edges[m];
                let center = edges[m + 1];
                let right = edges[m + 2].max(center + 1);
                triangle(left, center, right)
            })
            .collect();

        Self { filters }
    }

    fn mfcc_from_power(&self, power: &[f64], count: usize) -> Vec<f64> {
        let log_energies: Vec<f64> = self
            .filters
            .iter()
            .map(|filter| {
                let energy: f64 = filter
                    .iter()
                    .map(|&(bin, w)| power.get(bin).copied().unwrap_or(0.0) * w)
                    .sum();
                energy.max(1e-12).ln()
            })
            .collect();
        dct_ii(&log_energies, count)
    }
}

fn triangle(left: usize, center: usize, right: usize) -> Vec<(usize, f64)> {
    (left..=right)
        .filter_map(|bin| {
            let w = if bin < center {
                if center == left {
                    0.0
                } else {
                    (bin - left) as f64 / (center - left) as f64
                }
            } else if right == center {
                0.0
            } else {
                (right - bin) as f64 / (right - center) as f64
            };
            (w > 0.0).then_some((bin, w))
        })
        .collect()
}

fn freq_to_bin(freq_hz: f64, sample_rate: u32, frame_size: usize) -> usize {
    let sr = sample_rate.max(1) as f64;
    let freq = freq_hz.clamp(0.0, sr / 2.0);
    ((freq * frame_size as f64 / sr).floor() as usize).min(frame_size / 2)
}

fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10.0_f64.powf(mel / 2595.0) - 1.0)
}

fn dct_ii(values: &[f64], count: usize) -> Vec<f64> {
    let n = values.len().max(1) as f64;
    (0..count)
        .map(|k| {
            values
                .iter()
                .enumerate()
                .map(|(m, v)| v * (std::f64::consts::PI * k as f64 * (m as f64 + 0.5) / n).cos())
                .sum()
        })
        .collect()
}
