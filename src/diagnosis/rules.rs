//! Ordered decision tables per valve
//!
//! Rules are evaluated top to bottom and the first match wins. A valve whose
//! table is exhausted (or empty) is `Normal`. The comparison operators below
//! are exact; a feature sitting on a threshold falls on the documented side.

use super::label::DiagnosisLabel;
use super::valve::Valve;
use crate::analysis::FeatureVector;

/// Thresholds in raw amplitude units
pub mod thresholds {
    /// Aortic stenosis above this standard deviation
    pub const AORTIC_STENOSIS_STD_DEV: f64 = 3500.0;
    /// Mitral stenosis band: (MITRAL_LOWER_STD_DEV, MITRAL_UPPER_STD_DEV]
    pub const MITRAL_LOWER_STD_DEV: f64 = 1500.0;
    pub const MITRAL_UPPER_STD_DEV: f64 = 3500.0;
    /// Mitral regurgitation above this peak (with std_dev at or below the lower bound)
    pub const MITRAL_REGURGITATION_PEAK: f64 = 10000.0;
}

use thresholds::*;

/// One row of a decision table
pub struct Rule {
    pub label: DiagnosisLabel,
    /// Human-readable condition, as shown by the `rules` command
    pub condition: &'static str,
    pub predicate: fn(&FeatureVector) -> bool,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("label", &self.label)
            .field("condition", &self.condition)
            .finish()
    }
}

impl Rule {
    pub fn matches(&self, features: &FeatureVector) -> bool {
        (self.predicate)(features)
    }
}

fn aortic_stenosis(f: &FeatureVector) -> bool {
    f.std_dev > AORTIC_STENOSIS_STD_DEV
}

fn mitral_stenosis(f: &FeatureVector) -> bool {
    f.std_dev > MITRAL_LOWER_STD_DEV && f.std_dev <= MITRAL_UPPER_STD_DEV
}

fn mitral_regurgitation(f: &FeatureVector) -> bool {
    f.std_dev <= MITRAL_LOWER_STD_DEV && f.peak_amplitude > MITRAL_REGURGITATION_PEAK
}

static AORTIC_RULES: [Rule; 1] = [Rule {
    label: DiagnosisLabel::AorticStenosis,
    condition: "std_dev > 3500",
    predicate: aortic_stenosis,
}];

static MITRAL_RULES: [Rule; 2] = [
    Rule {
        label: DiagnosisLabel::MitralStenosis,
        condition: "1500 < std_dev <= 3500",
        predicate: mitral_stenosis,
    },
    Rule {
        label: DiagnosisLabel::MitralRegurgitation,
        condition: "std_dev <= 1500 AND peak_amplitude > 10000",
        predicate: mitral_regurgitation,
    },
];

// Pulmonary and tricuspid recordings have no rules of their own.
static NO_RULES: [Rule; 0] = [];

/// Decision table for a valve, in evaluation order
pub fn rules_for(valve: Valve) -> &'static [Rule] {
    match valve {
        Valve::Aortic => &AORTIC_RULES,
        Valve::Mitral => &MITRAL_RULES,
        Valve::Pulmonary | Valve::Tricuspid => &NO_RULES,
    }
}

/// First matching label, or `Normal`
pub fn evaluate(valve: Valve, features: &FeatureVector) -> DiagnosisLabel {
    rules_for(valve)
        .iter()
        .find(|rule| rule.matches(features))
        .map(|rule| rule.label)
        .unwrap_or(DiagnosisLabel::Normal)
}
