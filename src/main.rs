//! PCGScope CLI
//!
//! Command-line interface for phonocardiogram screening and case history.

use anyhow::Context;
use clap::Parser;
use log::info;
use tracing_subscriber::EnvFilter;

use pcgscope::cli::{commands, Cli, Commands};
use pcgscope::config::AppConfig;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("PCGScope v{}", env!("CARGO_PKG_VERSION"));

    let mut config = AppConfig::from_env();
    if let Some(store) = cli.store {
        config.case_store = store;
    }

    match cli.command {
        Commands::Analyze(args) => commands::analyze(&config, &args).context("analysis failed"),
        Commands::History => commands::history(&config)
            .with_context(|| format!("cannot read case history from {}", config.case_store.display())),
        Commands::Features { file, valve, extended } => commands::features(&config, &file, valve, extended)
            .with_context(|| format!("cannot extract features from {}", file.display())),
        Commands::Rules => commands::rules().context("cannot print rules"),
        Commands::Synth(args) => commands::synth(&args)
            .with_context(|| format!("cannot write {}", args.out.display())),
    }
}
