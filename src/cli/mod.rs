//! CLI Module
//!
//! Command-line interface for PCG analysis and case history.

pub mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::cases::{Gender, PatientRecord};
use crate::diagnosis::Valve;
use crate::error::{PcgError, Result};
use crate::narrative::ProviderKind;

/// PCGScope - phonocardiogram screening and case history
#[derive(Parser, Debug)]
#[command(name = "pcgscope")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Case store path (overrides PCG_CASE_STORE)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyse per-valve recordings and optionally save the case
    #[command(name = "analyze")]
    Analyze(AnalyzeArgs),

    /// List saved cases, most recent first
    #[command(name = "history")]
    History,

    /// Print the feature vector of one recording as JSON
    #[command(name = "features")]
    Features {
        /// WAV file to analyse
        file: PathBuf,

        /// Valve the recording belongs to
        #[arg(long)]
        valve: Valve,

        /// Include spectral and cepstral statistics
        #[arg(long)]
        extended: bool,
    },

    /// Print the screening decision tables
    #[command(name = "rules")]
    Rules,

    /// Write a synthetic fixture recording
    #[command(name = "synth")]
    Synth(SynthArgs),
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Aortic valve recording
    #[arg(long)]
    pub aortic: Option<PathBuf>,

    /// Pulmonary valve recording
    #[arg(long)]
    pub pulmonary: Option<PathBuf>,

    /// Mitral valve recording
    #[arg(long)]
    pub mitral: Option<PathBuf>,

    /// Tricuspid valve recording
    #[arg(long)]
    pub tricuspid: Option<PathBuf>,

    /// PCG trace image for the aortic narrative
    #[arg(long)]
    pub image_aortic: Option<PathBuf>,

    /// PCG trace image for the pulmonary narrative
    #[arg(long)]
    pub image_pulmonary: Option<PathBuf>,

    /// PCG trace image for the mitral narrative
    #[arg(long)]
    pub image_mitral: Option<PathBuf>,

    /// PCG trace image for the tricuspid narrative
    #[arg(long)]
    pub image_tricuspid: Option<PathBuf>,

    /// Visible window in seconds (1-10)
    #[arg(long, default_value_t = 8)]
    pub max_duration: u32,

    /// Amplitude scale (0.1-3.0)
    #[arg(long, default_value_t = 1.0)]
    pub amp_scale: f64,

    /// Zero scaled amplitudes below this magnitude (0-1000)
    #[arg(long, default_value_t = 0)]
    pub noise_threshold: u32,

    /// Include spectral and cepstral statistics
    #[arg(long)]
    pub extended: bool,

    /// Write each waveform as `<valve>.svg` into this directory
    #[arg(long)]
    pub svg_dir: Option<PathBuf>,

    /// Narrative provider (offline or http)
    #[arg(long)]
    pub narrative: Option<ProviderKind>,

    /// Save the analysis as a new case
    #[arg(long)]
    pub save: bool,

    #[command(flatten)]
    pub patient: PatientArgs,
}

impl AnalyzeArgs {
    /// `(valve, recording, image)` for every valve given a recording
    pub fn valve_files(&self) -> Vec<(Valve, &PathBuf, Option<&PathBuf>)> {
        [
            (Valve::Aortic, &self.aortic, &self.image_aortic),
            (Valve::Pulmonary, &self.pulmonary, &self.image_pulmonary),
            (Valve::Mitral, &self.mitral, &self.image_mitral),
            (Valve::Tricuspid, &self.tricuspid, &self.image_tricuspid),
        ]
        .into_iter()
        .filter_map(|(valve, audio, image)| audio.as_ref().map(|a| (valve, a, image.as_ref())))
        .collect()
    }
}

/// Patient demographics for `analyze --save`
#[derive(Args, Debug)]
pub struct PatientArgs {
    /// Patient name
    #[arg(long)]
    pub name: Option<String>,

    /// Age in years (0-120)
    #[arg(long, default_value_t = 30)]
    pub age: u32,

    /// Male, Female or Other
    #[arg(long, default_value = "Male")]
    pub gender: Gender,

    /// Height in centimetres
    #[arg(long, default_value_t = 170.0)]
    pub height: f64,

    /// Weight in kilograms
    #[arg(long, default_value_t = 65.0)]
    pub weight: f64,

    /// Contact phone number
    #[arg(long, default_value = "")]
    pub phone: String,
}

impl PatientArgs {
    pub fn to_record(&self) -> Result<PatientRecord> {
        let name = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| PcgError::InvalidPatient {
                reason: "a patient name is required to save a case".to_string(),
            })?;
        PatientRecord::new(
            name,
            self.age,
            self.gender,
            self.height,
            self.weight,
            self.phone.clone(),
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SynthKind {
    /// Every sample equal to the amplitude
    Constant,
    /// +amplitude, -amplitude, ...
    Alternating,
    /// Sine tone at --frequency
    Tone,
}

#[derive(Args, Debug)]
pub struct SynthArgs {
    /// Output WAV path
    pub out: PathBuf,

    #[arg(long, value_enum, default_value_t = SynthKind::Tone)]
    pub kind: SynthKind,

    /// Amplitude in raw units
    #[arg(long, default_value_t = 1000.0, allow_negative_numbers = true)]
    pub amplitude: f64,

    /// Duration in seconds
    #[arg(long, default_value_t = 1.0)]
    pub duration: f64,

    /// Sample rate in Hz
    #[arg(long, default_value_t = 4000)]
    pub sample_rate: u32,

    /// Tone frequency in Hz
    #[arg(long, default_value_t = 50.0)]
    pub frequency: f64,

    /// Bits per sample (8, 16, 24 or 32)
    #[arg(long, default_value_t = 16)]
    pub bits: u16,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_analyze_arguments() {
        let cli = Cli::try_parse_from([
            "pcgscope",
            "--store",
            "cases.json",
            "analyze",
            "--mitral",
            "m.wav",
            "--image-mitral",
            "m.png",
            "--aortic",
            "a.wav",
            "--narrative",
            "offline",
            "--gender",
            "female",
        ])
        .unwrap();

        assert_eq!(cli.store, Some(PathBuf::from("cases.json")));
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        let files = args.valve_files();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].0, Valve::Aortic);
        assert!(files[0].2.is_none());
        assert_eq!(files[1].2, Some(&PathBuf::from("m.png")));
        assert_eq!(args.narrative, Some(ProviderKind::Offline));
        assert_eq!(args.patient.gender, Gender::Female);
        assert_eq!(args.max_duration, 8);
    }

    #[test]
    fn test_patient_name_required() {
        let cli = Cli::try_parse_from(["pcgscope", "analyze", "--save"]).unwrap();
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert!(args.patient.to_record().is_err());
    }

    #[test]
    fn test_features_valve_parsing() {
        let cli = Cli::try_parse_from(["pcgscope", "features", "x.wav", "--valve", "mitral"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Features {
                valve: Valve::Mitral,
                ..
            }
        ));
    }
}
