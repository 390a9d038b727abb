//! CLI Module
//!
//! Command-line surface for voxmatch. This is the presentation layer: it
//! loads and analyzes up front (failing fast before the comparator is
//! touched), renders the comparison chart, and turns the verification
//! result into a user-visible label.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default well-known path the comparison chart is written to
pub const DEFAULT_CHART_PATH: &str = "frequency_profile.png";

/// Voxmatch - speaker verification with frequency analysis
#[derive(Parser, Debug)]
#[command(name = "voxmatch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Verify whether two recordings are the same speaker
    #[command(name = "compare")]
    Compare {
        /// Reference recording (WAV, MP3, Ogg, FLAC, M4A, or video)
        reference: PathBuf,

        /// Recording to compare against the reference
        test: PathBuf,

        /// Where to write the comparison chart
        #[arg(long, default_value = DEFAULT_CHART_PATH)]
        chart: PathBuf,

        /// Print the verification result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the frequency profile summary of a single recording
    #[command(name = "analyze")]
    Analyze {
        /// Recording to analyze
        input: PathBuf,
    },
}
