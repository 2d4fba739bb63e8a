//! Rule-based valve classifier

use serde::{Deserialize, Serialize};

use super::label::DiagnosisLabel;
use super::rules;
use super::valve::Valve;
use crate::analysis::FeatureVector;

/// Outcome of classifying one feature vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisResult {
    pub valve: Valve,
    pub label: DiagnosisLabel,
    pub narrative: String,
}

/// Deterministic, total classifier over the per-valve decision tables
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagnosticClassifier;

impl DiagnosticClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify a feature vector for the given valve
    ///
    /// Every input maps to a label; nothing matching means `Normal`.
    pub fn classify(&self, valve: Valve, features: &FeatureVector) -> DiagnosisResult {
        let label = rules::evaluate(valve, features);

        tracing::info!(
            %valve,
            std_dev = features.std_dev,
            peak = features.peak_amplitude,
            label = ?label,
            "rule-based screening"
        );

        DiagnosisResult {
            valve,
            label,
            narrative: label.narrative(),
        }
    }
}
