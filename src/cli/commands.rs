//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use super::{AnalyzeArgs, SynthArgs, SynthKind};
use crate::analysis::{FeatureExtractor, WaveformParams};
use crate::audio::{decode_wav_file, synth, write_wav_file};
use crate::cases::{CaseRepository, JsonCaseStore};
use crate::config::AppConfig;
use crate::diagnosis::{rules_for, DiagnosisLabel, Valve};
use crate::error::{PcgError, Result};
use crate::narrative::build_provider;
use crate::pipeline::{Orchestrator, SessionReport, ValveOutcome, ValveUpload};

const SVG_WIDTH: u32 = 900;
const SVG_HEIGHT: u32 = 300;

/// Analyse the given recordings, print the report and optionally save it.
pub fn analyze(config: &AppConfig, args: &AnalyzeArgs) -> Result<()> {
    let files = args.valve_files();
    if files.is_empty() {
        return Err(PcgError::InvalidParameter {
            param: "recordings".to_string(),
            value: "none".to_string(),
            expected: "at least one of --aortic, --pulmonary, --mitral, --tricuspid".to_string(),
        });
    }

    // Demographics are checked up front so a bad --save fails before any work.
    let patient = if args.save {
        Some(args.patient.to_record()?)
    } else {
        None
    };

    let params = WaveformParams::from_controls(args.max_duration, args.amp_scale, args.noise_threshold)?;
    let extractor = FeatureExtractor::new().with_extended(args.extended || config.extended_features);
    let mut orchestrator = Orchestrator::new()
        .with_extractor(extractor)
        .with_waveform_params(params)?;
    if let Some(kind) = args.narrative {
        orchestrator = orchestrator.with_narrator(build_provider(kind, &config.narrative)?);
    }

    let mut session = SessionReport::default();
    for (valve, audio_path, image_path) in files {
        let outcome = match load_upload(valve, audio_path, image_path) {
            Ok(upload) => orchestrator.process(&upload),
            Err(e) => ValveOutcome::failed(valve, e),
        };
        session.outcomes.push(outcome);
    }
    print_session(&session);

    if let Some(dir) = &args.svg_dir {
        write_svgs(&session, dir)?;
    }

    if session.successes().next().is_none() {
        warn!("No recording could be analysed");
    }

    if let Some(patient) = patient {
        let store = open_store(config)?;
        let record = session.save_case(patient, &store)?;
        println!(
            "Case saved for {} at {}",
            record.patient.name(),
            record.timestamp.to_rfc3339()
        );
    }

    Ok(())
}

/// List saved cases, most recent first.
pub fn history(config: &AppConfig) -> Result<()> {
    info!("Loading case history: {}", config.case_store.display());

    let store = open_store(config)?;
    let cases = store.list_all()?;
    if cases.is_empty() {
        println!("No saved cases");
        return Ok(());
    }

    for case in cases {
        let patient = &case.patient;
        println!("{} (Age {}, {})", patient.name(), patient.age(), patient.gender());
        println!("Recorded: {}", case.timestamp.to_rfc3339());
        match patient.bmi() {
            Some(bmi) => println!("BMI: {:.1}", bmi),
            None => println!("BMI: n/a"),
        }
        for (key, entry) in &case.analysis {
            println!("{}:", key);
            println!("{}", entry.display_text());
        }
        println!("---");
    }

    Ok(())
}

/// Print one recording's feature vector as JSON.
pub fn features(config: &AppConfig, path: &Path, valve: Valve, extended: bool) -> Result<()> {
    info!("Extracting features: {}", path.display());

    let sample = decode_wav_file(path)?;
    let vector = FeatureExtractor::new()
        .with_extended(extended || config.extended_features)
        .extract(&sample, valve);
    println!("{}", serde_json::to_string_pretty(&vector)?);

    Ok(())
}

/// Print every valve's decision table.
pub fn rules() -> Result<()> {
    for valve in Valve::ALL {
        println!("{}", valve.display_name());
        for rule in rules_for(valve) {
            println!("  {:<45} => {}", rule.condition, rule.label.title());
        }
        println!("  {:<45} => {}", "otherwise", DiagnosisLabel::Normal.title());
    }
    Ok(())
}

/// Write a synthetic recording.
pub fn synth(args: &SynthArgs) -> Result<()> {
    info!("Synthesising {:?} recording: {}", args.kind, args.out.display());

    let sample = match args.kind {
        SynthKind::Constant => synth::constant(args.amplitude, args.duration, args.sample_rate)?,
        SynthKind::Alternating => synth::alternating(args.amplitude, args.duration, args.sample_rate)?,
        SynthKind::Tone => synth::sine_tone(args.frequency, args.amplitude, args.duration, args.sample_rate)?,
    };
    write_wav_file(&sample, &args.out, args.bits)?;

    println!(
        "Wrote {} samples at {} Hz to {}",
        sample.len(),
        sample.sample_rate(),
        args.out.display()
    );
    Ok(())
}

fn open_store(config: &AppConfig) -> Result<JsonCaseStore> {
    Ok(JsonCaseStore::open(&config.case_store)?.with_lock_timeout(config.store_lock_timeout()))
}

/// Read one valve's files; an unreadable image only affects the narrative
fn load_upload(valve: Valve, audio_path: &Path, image_path: Option<&PathBuf>) -> Result<ValveUpload> {
    info!("Reading {} recording: {}", valve, audio_path.display());
    let upload = ValveUpload::new(valve, read_file(audio_path)?);
    let Some(path) = image_path else {
        return Ok(upload);
    };
    match read_file(path) {
        Ok(image) => Ok(upload.with_image(image)),
        Err(e) => {
            warn!("{} image could not be read: {}", valve, e);
            Ok(upload.with_image_error(e.to_string()))
        }
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => PcgError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => PcgError::Io(e),
    })
}

fn print_session(session: &SessionReport) {
    for outcome in &session.outcomes {
        println!("== {} Analysis ==", outcome.valve);
        match &outcome.report {
            Ok(report) => {
                println!("Features: {}", report.features.summary());
                println!("{}", report.diagnosis.narrative);
                if let Some(text) = &report.external_narrative {
                    println!("External narrative:");
                    println!("{}", text);
                }
            }
            Err(e) => {
                warn!("{} recording could not be analysed: {}", outcome.valve, e);
                println!("Error [{}]: {}", e.error_code(), e);
                for hint in e.recovery_suggestions() {
                    println!("  - {}", hint);
                }
            }
        }
        println!();
    }
}

fn write_svgs(session: &SessionReport, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    for report in session.successes() {
        let path = dir.join(format!("{}.svg", report.valve.as_str()));
        fs::write(&path, report.waveform.to_svg(SVG_WIDTH, SVG_HEIGHT))?;
        println!("Waveform written: {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::encode_wav;
    use crate::cases::AnalysisEntry;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::ffi::OsString;

    fn config_in(dir: &Path) -> AppConfig {
        AppConfig {
            case_store: dir.join("cases.json"),
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_analyze_save_and_history() {
        let dir = tempfile::tempdir().unwrap();
        let wav = dir.path().join("aortic.wav");
        fs::write(&wav, encode_wav(&synth::constant(0.0, 0.5, 1000).unwrap(), 16).unwrap()).unwrap();
        let svg_dir = dir.path().join("svg");

        let argv: Vec<OsString> = vec![
            "pcgscope".into(),
            "analyze".into(),
            "--aortic".into(),
            wav.clone().into_os_string(),
            "--svg-dir".into(),
            svg_dir.clone().into_os_string(),
            "--save".into(),
            "--name".into(),
            "Ada".into(),
        ];
        let cli = Cli::try_parse_from(argv).unwrap();
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };

        let config = config_in(dir.path());
        analyze(&config, &args).unwrap();
        assert!(svg_dir.join("aortic.svg").exists());

        let cases = JsonCaseStore::open(&config.case_store).unwrap().list_all().unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].patient.name(), "Ada");
        assert!(cases[0].analysis.contains_key("aortic"));

        history(&config).unwrap();
    }

    #[test]
    fn test_analyze_requires_a_recording() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::try_parse_from(["pcgscope", "analyze"]).unwrap();
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        let err = analyze(&config_in(dir.path()), &args).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PARAMETER");
    }

    #[test]
    fn test_missing_recording_skips_only_that_valve() {
        let dir = tempfile::tempdir().unwrap();
        let wav = dir.path().join("aortic.wav");
        fs::write(&wav, encode_wav(&synth::constant(0.0, 0.5, 1000).unwrap(), 16).unwrap()).unwrap();

        let argv: Vec<OsString> = vec![
            "pcgscope".into(),
            "analyze".into(),
            "--aortic".into(),
            wav.into_os_string(),
            "--mitral".into(),
            "/nonexistent/m.wav".into(),
            "--save".into(),
            "--name".into(),
            "Ada".into(),
        ];
        let cli = Cli::try_parse_from(argv).unwrap();
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };

        let config = config_in(dir.path());
        analyze(&config, &args).unwrap();

        let cases = JsonCaseStore::open(&config.case_store).unwrap().list_all().unwrap();
        assert_eq!(cases.len(), 1);
        assert!(cases[0].analysis.contains_key("aortic"));
        assert!(!cases[0].analysis.contains_key("mitral"));
    }

    #[test]
    fn test_missing_image_becomes_narrative_error() {
        let dir = tempfile::tempdir().unwrap();
        let wav = dir.path().join("aortic.wav");
        fs::write(&wav, encode_wav(&synth::constant(0.0, 0.5, 1000).unwrap(), 16).unwrap()).unwrap();

        let argv: Vec<OsString> = vec![
            "pcgscope".into(),
            "analyze".into(),
            "--aortic".into(),
            wav.into_os_string(),
            "--image-aortic".into(),
            "/nonexistent/a.png".into(),
            "--narrative".into(),
            "offline".into(),
            "--save".into(),
            "--name".into(),
            "Ada".into(),
        ];
        let cli = Cli::try_parse_from(argv).unwrap();
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };

        let config = config_in(dir.path());
        analyze(&config, &args).unwrap();

        let case = &JsonCaseStore::open(&config.case_store).unwrap().list_all().unwrap()[0];
        assert!(matches!(case.analysis["aortic"], AnalysisEntry::Diagnosis(_)));
        let text = case.analysis["aortic_external"].display_text();
        assert!(text.starts_with("Narrative Service Error: File not found"));
    }

    #[test]
    fn test_synth_then_features() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("tone.wav");
        let args = SynthArgs {
            out: out.clone(),
            kind: SynthKind::Alternating,
            amplitude: 12000.0,
            duration: 0.25,
            sample_rate: 2000,
            frequency: 50.0,
            bits: 16,
        };
        synth(&args).unwrap();
        assert_eq!(decode_wav_file(&out).unwrap().len(), 500);
        features(&config_in(dir.path()), &out, Valve::Mitral, true).unwrap();
    }
}
