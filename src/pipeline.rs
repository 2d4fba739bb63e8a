//! Session orchestration
//!
//! Drives each uploaded valve recording through decode, feature extraction,
//! waveform rendering and classification, optionally asks a narrative
//! provider for external commentary, and turns the session into a saved
//! case on request. A failure in one valve never stops the others.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use crate::analysis::{render_waveform, FeatureExtractor, FeatureVector, WaveformParams, WaveformView};
use crate::audio::decode_wav;
use crate::cases::{AnalysisEntry, CaseRecord, CaseRepository, PatientRecord};
use crate::diagnosis::{DiagnosisResult, DiagnosticClassifier, Valve};
use crate::error::{PcgError, Result};
use crate::narrative::{NarrativeProvider, NarrativeRequest};

/// Prefix stored in place of external text when the service fails
pub const NARRATIVE_ERROR_PREFIX: &str = "Narrative Service Error: ";

/// One valve's uploaded recording and optional trace image
#[derive(Debug, Clone)]
pub struct ValveUpload {
    pub valve: Valve,
    pub audio: Vec<u8>,
    pub image: Option<Vec<u8>>,
    /// Why a supplied trace image could not be read
    pub image_error: Option<String>,
}

impl ValveUpload {
    pub fn new(valve: Valve, audio: Vec<u8>) -> Self {
        Self {
            valve,
            audio,
            image: None,
            image_error: None,
        }
    }

    pub fn with_image(mut self, image: Vec<u8>) -> Self {
        self.image = Some(image);
        self.image_error = None;
        self
    }

    /// Mark the trace image as unreadable; the narrative records the reason
    pub fn with_image_error(mut self, reason: impl Into<String>) -> Self {
        self.image = None;
        self.image_error = Some(reason.into());
        self
    }
}

/// Everything computed for a successfully decoded valve
#[derive(Debug, Clone)]
pub struct ValveReport {
    pub valve: Valve,
    /// Hex SHA-256 of the uploaded WAV bytes
    pub source_sha256: String,
    pub sample_rate: u32,
    pub features: FeatureVector,
    pub diagnosis: DiagnosisResult,
    pub waveform: WaveformView,
    /// External text, or the error text that replaced it
    pub external_narrative: Option<String>,
}

/// Result for one uploaded valve
#[derive(Debug)]
pub struct ValveOutcome {
    pub valve: Valve,
    pub report: Result<ValveReport>,
}

impl ValveOutcome {
    /// Outcome for a valve whose upload never reached the pipeline
    pub fn failed(valve: Valve, error: PcgError) -> Self {
        Self {
            valve,
            report: Err(error),
        }
    }
}

/// All valves processed in one request, in upload order
#[derive(Debug, Default)]
pub struct SessionReport {
    pub outcomes: Vec<ValveOutcome>,
}

impl SessionReport {
    pub fn successes(&self) -> impl Iterator<Item = &ValveReport> {
        self.outcomes.iter().filter_map(|o| o.report.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &ValveOutcome> {
        self.outcomes.iter().filter(|o| o.report.is_err())
    }

    /// Analysis map for a saved case
    ///
    /// `"<valve>"` holds each diagnosis and `"<valve>_external"` any external
    /// narrative. Valves that failed to decode contribute nothing.
    pub fn analysis_map(&self) -> BTreeMap<String, AnalysisEntry> {
        let mut analysis = BTreeMap::new();
        for report in self.successes() {
            analysis.insert(
                report.valve.analysis_key(),
                AnalysisEntry::Diagnosis(report.diagnosis.clone()),
            );
            if let Some(text) = &report.external_narrative {
                analysis.insert(
                    report.valve.external_key(),
                    AnalysisEntry::Narrative(text.clone()),
                );
            }
        }
        analysis
    }

    /// Persist this session as a new case and return the stored record
    pub fn save_case(
        &self,
        patient: PatientRecord,
        repository: &dyn CaseRepository,
    ) -> Result<CaseRecord> {
        let record = CaseRecord::new(patient, self.analysis_map());
        repository.append(record.clone())?;
        tracing::info!(
            patient = record.patient.name(),
            entries = record.analysis.len(),
            "case saved"
        );
        Ok(record)
    }
}

/// Wires decoding, analysis, screening and narrative enrichment
pub struct Orchestrator<'a> {
    extractor: FeatureExtractor,
    classifier: DiagnosticClassifier,
    waveform: WaveformParams,
    narrator: Option<Box<dyn NarrativeProvider + 'a>>,
}

impl Default for Orchestrator<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Orchestrator<'a> {
    pub fn new() -> Self {
        Self {
            extractor: FeatureExtractor::new(),
            classifier: DiagnosticClassifier::new(),
            waveform: WaveformParams::default(),
            narrator: None,
        }
    }

    pub fn with_extractor(mut self, extractor: FeatureExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Display parameters; validated here so every valve sees valid ones
    pub fn with_waveform_params(mut self, params: WaveformParams) -> Result<Self> {
        params.validate()?;
        self.waveform = params;
        Ok(self)
    }

    pub fn with_narrator(mut self, narrator: impl NarrativeProvider + 'a) -> Self {
        self.narrator = Some(Box::new(narrator));
        self
    }

    /// Process every upload independently
    pub fn run(&self, uploads: &[ValveUpload]) -> SessionReport {
        SessionReport {
            outcomes: uploads.iter().map(|upload| self.process(upload)).collect(),
        }
    }

    /// Process one upload, keeping any failure in the outcome
    pub fn process(&self, upload: &ValveUpload) -> ValveOutcome {
        let report = self.analyze(upload);
        if let Err(e) = &report {
            tracing::warn!(valve = %upload.valve, error = %e, "valve analysis failed");
        }
        ValveOutcome {
            valve: upload.valve,
            report,
        }
    }

    /// Process a single valve upload
    pub fn analyze(&self, upload: &ValveUpload) -> Result<ValveReport> {
        let valve = upload.valve;
        let sample = decode_wav(&upload.audio)?;
        let features = self.extractor.extract(&sample, valve);
        let diagnosis = self.classifier.classify(valve, &features);
        let waveform = render_waveform(
            &sample,
            &self.waveform,
            &format!("{} Waveform", valve.display_name()),
        )?;
        let external_narrative = self.narrate(upload, &features);

        tracing::info!(%valve, label = ?diagnosis.label, samples = sample.len(), "valve analysed");

        Ok(ValveReport {
            valve,
            source_sha256: format!("{:x}", Sha256::digest(&upload.audio)),
            sample_rate: sample.sample_rate(),
            features,
            diagnosis,
            waveform,
            external_narrative,
        })
    }

    /// Ask the narrator, if any; failures become error text
    fn narrate(&self, upload: &ValveUpload, features: &FeatureVector) -> Option<String> {
        let narrator = self.narrator.as_ref()?;
        let valve = upload.valve;
        if let Some(reason) = &upload.image_error {
            tracing::warn!(%valve, error = %reason, "trace image unavailable for narrative");
            return Some(format!("{}{}", NARRATIVE_ERROR_PREFIX, reason));
        }

        let summary = features.summary();
        let request = match upload.image.as_deref() {
            Some(bytes) => NarrativeRequest::Image { valve, bytes },
            None => NarrativeRequest::Features {
                valve,
                summary: &summary,
            },
        };

        match narrator.summarize(&request) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!(%valve, provider = narrator.name(), error = %e, "narrative service failed");
                Some(format!("{}{}", NARRATIVE_ERROR_PREFIX, e))
            }
        }
    }
}
