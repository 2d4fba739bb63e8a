//! Saved case records

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::patient::PatientRecord;
use crate::diagnosis::DiagnosisResult;

/// One value in a case's analysis map
///
/// `"<valve>"` keys hold the rule-based diagnosis, `"<valve>_external"` keys
/// hold narrative service text (or the error text that replaced it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisEntry {
    Diagnosis(DiagnosisResult),
    Narrative(String),
}

impl AnalysisEntry {
    /// Text to show for this entry
    pub fn display_text(&self) -> &str {
        match self {
            AnalysisEntry::Diagnosis(result) => &result.narrative,
            AnalysisEntry::Narrative(text) => text,
        }
    }
}

/// A saved patient visit; never modified after creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub timestamp: DateTime<Utc>,
    pub patient: PatientRecord,
    pub analysis: BTreeMap<String, AnalysisEntry>,
}

impl CaseRecord {
    /// Create a record stamped with the current time
    pub fn new(patient: PatientRecord, analysis: BTreeMap<String, AnalysisEntry>) -> Self {
        Self::with_timestamp(Utc::now(), patient, analysis)
    }

    pub fn with_timestamp(
        timestamp: DateTime<Utc>,
        patient: PatientRecord,
        analysis: BTreeMap<String, AnalysisEntry>,
    ) -> Self {
        Self {
            timestamp,
            patient,
            analysis,
        }
    }
}
