//! Voxmatch - Speaker Verification with Frequency Analysis
//!
//! Voxmatch decides whether two recordings were spoken by the same person
//! and visualizes the frequency-domain similarity between them.
//!
//! # Architecture
//!
//! The pipeline has three stages:
//! - Loader: normalizes any supported source file (WAV, compressed audio,
//!   audio embedded in video) into a mono 16 kHz floating-point buffer
//! - Spectrum analyzer: pure functions computing normalized power spectra,
//!   spectral centers of mass, and a shared zoom window for display
//! - Verification scheduler: runs the speaker comparator off the caller's
//!   thread, one request at a time, delivering the decision asynchronously
//!
//! Chart rendering and the CLI sit on top of the pipeline and consume its
//! outputs; they never feed back into it.

pub mod audio;
pub mod chart;
pub mod cli;
pub mod error;
pub mod spectrum;
pub mod verify;

// Re-export commonly used types
pub use audio::{AudioBuffer, SAMPLE_RATE};
pub use error::{AnalysisError, Error, LoadError, Result, SchedulerError};
pub use spectrum::{FrequencyProfile, ZoomWindow};
pub use verify::{VerificationRequest, VerificationResult, VerificationScheduler};
