//! Heart valve identity

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PcgError;

/// The four auscultation sites, each analysed independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Valve {
    Aortic,
    Pulmonary,
    Mitral,
    Tricuspid,
}

impl Valve {
    /// All valves in upload order
    pub const ALL: [Valve; 4] = [
        Valve::Aortic,
        Valve::Pulmonary,
        Valve::Mitral,
        Valve::Tricuspid,
    ];

    /// Lowercase identifier used as the analysis key
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aortic => "aortic",
            Self::Pulmonary => "pulmonary",
            Self::Mitral => "mitral",
            Self::Tricuspid => "tricuspid",
        }
    }

    /// Display name, e.g. "Aortic Valve"
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Aortic => "Aortic Valve",
            Self::Pulmonary => "Pulmonary Valve",
            Self::Mitral => "Mitral Valve",
            Self::Tricuspid => "Tricuspid Valve",
        }
    }

    /// Key of the rule-based diagnosis in a case record
    pub fn analysis_key(&self) -> String {
        self.as_str().to_string()
    }

    /// Key of the narrative service output in a case record
    pub fn external_key(&self) -> String {
        format!("{}_external", self.as_str())
    }
}

impl fmt::Display for Valve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Valve {
    type Err = PcgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        let name = normalized
            .strip_suffix(" valve")
            .or_else(|| normalized.strip_suffix("-valve"))
            .or_else(|| normalized.strip_suffix("_valve"))
            .unwrap_or(&normalized);
        match name {
            "aortic" => Ok(Self::Aortic),
            "pulmonary" | "pulmonic" => Ok(Self::Pulmonary),
            "mitral" => Ok(Self::Mitral),
            "tricuspid" => Ok(Self::Tricuspid),
            _ => Err(PcgError::UnknownValve {
                name: s.to_string(),
            }),
        }
    }
}
