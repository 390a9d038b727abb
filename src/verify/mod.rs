//! Speaker verification
//!
//! The comparator is an opaque capability mapping two mono 16 kHz sample
//! sequences to a similarity measure; the scheduler runs exactly one
//! comparator call at a time on a background thread and delivers the
//! thresholded decision through a handle.

pub mod comparator;
pub mod mock;
pub mod scheduler;

pub use comparator::{Similarity, SpeakerComparator, SpectralComparator};
pub use scheduler::{
    RequestState, VerificationHandle, VerificationRequest, VerificationResult,
    VerificationScheduler, MATCH_THRESHOLD,
};
