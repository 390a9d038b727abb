//! Voxmatch CLI - Speaker Verification with Frequency Analysis
//!
//! Command-line interface for the voxmatch verification pipeline.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use env_logger::Env;
use log::{error, info};

use voxmatch::cli::{commands, Cli, Commands};
use voxmatch::verify::SpectralComparator;

fn main() -> ExitCode {
    // Initialize logger
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    info!("Voxmatch v{}", env!("CARGO_PKG_VERSION"));

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> voxmatch::Result<()> {
    match cli.command {
        Commands::Compare {
            reference,
            test,
            chart,
            json,
        } => {
            // The comparator is constructed once, before any request. A
            // model-backed implementation would load its weights here and a
            // failure would abort the run; the built-in spectral comparator
            // has nothing to load.
            let comparator = Arc::new(SpectralComparator::new());
            commands::compare(comparator, &reference, &test, &chart, json)
        }
        Commands::Analyze { input } => commands::analyze(&input),
    }
}
