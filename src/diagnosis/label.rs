//! Diagnosis labels and their fixed narrative templates

use std::fmt;

use serde::{Deserialize, Serialize};

/// Possible outcomes of the rule-based screening
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosisLabel {
    Normal,
    AorticStenosis,
    MitralStenosis,
    MitralRegurgitation,
}

impl DiagnosisLabel {
    /// Clinical name
    pub fn title(&self) -> &'static str {
        match self {
            Self::Normal => "Normal Heart Sounds",
            Self::AorticStenosis => "Aortic Stenosis (AS)",
            Self::MitralStenosis => "Mitral Stenosis (MS)",
            Self::MitralRegurgitation => "Mitral Regurgitation (MR)",
        }
    }

    /// Auscultation finding associated with the label
    pub fn finding(&self) -> &'static str {
        match self {
            Self::Normal => "Normal S1/S2, no murmurs.",
            Self::AorticStenosis => "Crescendo-decrescendo midsystolic murmur.",
            Self::MitralStenosis => "Low-frequency diastolic rumbling murmur.",
            Self::MitralRegurgitation => "Holosystolic blowing murmur.",
        }
    }

    /// Fixed markdown narrative for this label
    pub fn narrative(&self) -> String {
        format!(
            "**Likely Diagnosis:** {}\n\n**Analysis:** {}",
            self.title(),
            self.finding()
        )
    }
}

impl fmt::Display for DiagnosisLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}
