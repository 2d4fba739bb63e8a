//! Feature extraction
//!
//! The classifier only reads `std_dev` and `peak_amplitude`. The extended
//! statistics exist for narrative collaborators and are computed only when
//! requested.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::spectral::{spectral_summary, SpectralConfig};
use super::time_domain;
use crate::audio::AudioSample;
use crate::diagnosis::Valve;

/// Fixed-shape summary of one valve recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub valve: Valve,
    /// Population standard deviation in raw amplitude units
    pub std_dev: f64,
    /// Largest absolute amplitude in raw units
    pub peak_amplitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended: Option<ExtendedFeatures>,
}

/// Optional statistics over the samples and their STFT
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtendedFeatures {
    pub duration_seconds: f64,
    pub rms: f64,
    pub zero_crossing_rate: f64,
    pub spectral_centroid_hz: f64,
    pub mfcc_means: Vec<f64>,
}

impl ExtendedFeatures {
    /// Flatten into named statistics (`mfcc_1` .. `mfcc_n` for the cepstrum)
    pub fn named_statistics(&self) -> BTreeMap<String, f64> {
        let mut stats = BTreeMap::new();
        stats.insert("duration_seconds".to_string(), self.duration_seconds);
        stats.insert("rms".to_string(), self.rms);
        stats.insert("zero_crossing_rate".to_string(), self.zero_crossing_rate);
        stats.insert("spectral_centroid_hz".to_string(), self.spectral_centroid_hz);
        for (i, value) in self.mfcc_means.iter().enumerate() {
            stats.insert(format!("mfcc_{}", i + 1), *value);
        }
        stats
    }
}

impl FeatureVector {
    /// One-paragraph plain-text summary handed to narrative providers
    pub fn summary(&self) -> String {
        let mut text = format!(
            "{}: std_dev={:.1}, peak_amplitude={:.1}",
            self.valve.display_name(),
            self.std_dev,
            self.peak_amplitude
        );
        if let Some(extended) = &self.extended {
            for (name, value) in extended.named_statistics() {
                text.push_str(&format!(", {}={:.4}", name, value));
            }
        }
        text
    }
}

/// Computes feature vectors from decoded recordings
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    extended: bool,
    spectral: SpectralConfig,
}

impl FeatureExtractor {
    /// Extractor producing only the classifier inputs
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the extended statistics
    pub fn with_extended(mut self, extended: bool) -> Self {
        self.extended = extended;
        self
    }

    /// Override the STFT parameters used for extended statistics
    pub fn with_spectral_config(mut self, config: SpectralConfig) -> Self {
        self.spectral = config;
        self
    }

    /// Whether extended statistics are computed
    pub fn extended_enabled(&self) -> bool {
        self.extended
    }

    /// Compute the feature vector of one recording
    pub fn extract(&self, sample: &AudioSample, valve: Valve) -> FeatureVector {
        let samples = sample.samples();
        let std_dev = time_domain::std_dev(samples);
        let peak_amplitude = time_domain::peak_amplitude(samples);

        let extended = self.extended.then(|| {
            let spectral = spectral_summary(samples, sample.sample_rate(), &self.spectral);
            ExtendedFeatures {
                duration_seconds: time_domain::duration_seconds(
                    samples.len(),
                    sample.sample_rate(),
                ),
                rms: time_domain::rms(samples),
                zero_crossing_rate: time_domain::zero_crossing_rate(samples),
                spectral_centroid_hz: spectral.spectral_centroid_hz,
                mfcc_means: spectral.mfcc_means,
            }
        });

        tracing::debug!(%valve, std_dev, peak_amplitude, extended = extended.is_some(), "extracted features");

        FeatureVector {
            valve,
            std_dev,
            peak_amplitude,
            extended,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::synth;
    use approx::assert_relative_eq;

    #[test]
    fn test_constant_zero_recording() {
        let sample = synth::constant(0.0, 1.0, 1000).unwrap();
        let features = FeatureExtractor::new().extract(&sample, Valve::Aortic);
        assert_eq!(features.std_dev, 0.0);
        assert_eq!(features.peak_amplitude, 0.0);
        assert!(features.extended.is_none());
    }

    #[test]
    fn test_alternating_recording() {
        let sample = synth::alternating(12000.0, 1.0, 1000).unwrap();
        let features = FeatureExtractor::new().extract(&sample, Valve::Mitral);
        assert_relative_eq!(features.std_dev, 12000.0);
        assert_eq!(features.peak_amplitude, 12000.0);
        assert_eq!(features.valve, Valve::Mitral);
    }

    #[test]
    fn test_extended_features() {
        let sample = synth::alternating(500.0, 2.0, 1000).unwrap();
        let features = FeatureExtractor::new()
            .with_extended(true)
            .extract(&sample, Valve::Tricuspid);
        let extended = features.extended.expect("extended requested");
        assert_relative_eq!(extended.duration_seconds, 2.0);
        assert_relative_eq!(extended.rms, 500.0);
        assert_relative_eq!(extended.zero_crossing_rate, 1.0);
        // alternating signal sits at Nyquist
        assert!(extended.spectral_centroid_hz > 400.0);
        assert_eq!(extended.mfcc_means.len(), 13);
    }

    #[test]
    fn test_named_statistics_and_summary() {
        let sample = synth::sine_tone(100.0, 2000.0, 1.0, 4000).unwrap();
        let features = FeatureExtractor::new()
            .with_extended(true)
            .extract(&sample, Valve::Aortic);
        let stats = features.extended.as_ref().unwrap().named_statistics();
        assert!(stats.contains_key("rms"));
        assert!(stats.contains_key("mfcc_13"));
        assert_eq!(stats.len(), 4 + 13);

        let summary = features.summary();
        assert!(summary.starts_with("Aortic Valve: std_dev="));
        assert!(summary.contains("zero_crossing_rate="));
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let sample = synth::sine_tone(60.0, 3000.0, 1.5, 2000).unwrap();
        let extractor = FeatureExtractor::new().with_extended(true);
        assert_eq!(
            extractor.extract(&sample, Valve::Pulmonary),
            extractor.extract(&sample, Valve::Pulmonary)
        );
    }
}
