//! Signal analysis
//!
//! Feature extraction for the classifier and narrative collaborators, and
//! the parameterized waveform view.

pub mod features;
pub mod spectral;
pub mod time_domain;
pub mod waveform;

pub use features::{ExtendedFeatures, FeatureExtractor, FeatureVector};
pub use spectral::SpectralConfig;
pub use waveform::{render_waveform, WaveformParams, WaveformView};
