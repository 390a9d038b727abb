//! Error types for voxmatch
//!
//! Each pipeline stage has its own error enum so callers can fail fast at
//! the stage boundary: loading and analysis errors are reported before the
//! comparator is ever invoked.

use thiserror::Error;

/// Result type alias for voxmatch operations
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced while loading a source file into an [`crate::audio::AudioBuffer`]
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Unsupported file format: {format}")]
    Unsupported { format: String },

    #[error("Failed to decode audio: {reason}")]
    DecodeFailed {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Decoded stream contains no samples")]
    Empty,
}

/// Errors produced by spectrum analysis
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The signal carries no spectral power (all-zero or DC-only buffer),
    /// so normalization and the weighted mean are undefined.
    #[error("Signal carries no spectral power (silent buffer)")]
    SilentSignal,
}

/// Errors produced by a speaker comparator backend
#[derive(Error, Debug)]
pub enum ComparatorError {
    #[error("Input too short: need at least {min_samples} samples, got {got_samples}")]
    InputTooShort {
        min_samples: usize,
        got_samples: usize,
    },

    #[error("Comparator backend error: {0}")]
    Backend(String),
}

/// Errors produced by the verification scheduler
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// A request is already in flight. At most one verification runs at a
    /// time, enforced by the scheduler itself rather than by callers.
    #[error("A verification request is already in flight")]
    Busy,

    #[error("Speaker comparator failed")]
    ComparatorFailed {
        #[source]
        source: ComparatorError,
    },
}

/// Errors produced while rendering the comparison chart
#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Failed to write chart image: {0}")]
    Write(#[from] image::ImageError),
}

/// Top-level error type, used by the CLI and anywhere the stage does not matter
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Comparator(#[from] ComparatorError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Chart(#[from] ChartError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
