//! Time-domain statistics over raw amplitude values

/// Population standard deviation
pub fn std_dev(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let variance = samples
        .iter()
        .map(|&v| {
            let d = v - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    variance.max(0.0).sqrt()
}

/// Largest absolute amplitude
pub fn peak_amplitude(samples: &[f64]) -> f64 {
    samples.iter().map(|v| v.abs()).fold(0.0_f64, f64::max)
}

/// Root-mean-square energy
pub fn rms(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|v| v * v).sum();
    (sum / samples.len() as f64).max(0.0).sqrt()
}

/// Fraction of adjacent sample pairs whose sign differs (0..=1)
pub fn zero_crossing_rate(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let crossings = samples
        .windows(2)
        .filter(|pair| (pair[0] >= 0.0) != (pair[1] >= 0.0))
        .count();
    crossings as f64 / (samples.len() - 1) as f64
}

/// Length of the recording in seconds
pub fn duration_seconds(sample_count: usize, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    sample_count as f64 / sample_rate as f64
}
